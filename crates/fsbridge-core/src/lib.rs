// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! fsbridge core: filesystem primitives and the chunked transfer engine

pub mod bridge;
pub mod config;
pub mod error;
pub mod fsapi;
pub mod resolver;
pub mod transfer;

pub use bridge::FsBridge;
pub use config::{BridgeConfig, TransferConfig, DEFAULT_CHUNK_SIZE};
pub use error::{FsError, FsResult};
pub use fsapi::{FileType, FsApi, LocalFs};
pub use resolver::{FileUriResolver, PathResolver};
pub use transfer::{copy_inbound, copy_outbound, ChunkSink, ReadWindow};
