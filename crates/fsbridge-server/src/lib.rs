// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! fsbridge server: handler dispatch over a Unix socket transport
//!
//! ```no_run
//! use fsbridge_core::{FsBridge, TransferConfig};
//! use fsbridge_server::{BridgeServer, Router};
//!
//! let router = Router::new(FsBridge::local(TransferConfig::default()));
//! BridgeServer::new("/tmp/fsbridge.sock", router).run()?;
//! # Ok::<(), fsbridge_server::ServerError>(())
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use handlers::{handler_for, Handler, HandlerError};
pub use request::ApiRequest;
pub use response::{PacketResponse, ResponseError};
pub use router::{Aborted, Router};
pub use server::{handle_connection, BridgeServer, ServerError};
