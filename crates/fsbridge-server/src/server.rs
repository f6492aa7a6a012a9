// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Unix socket transport
//!
//! Each accepted connection is served on its own thread and carries any
//! number of sequential exchanges:
//!
//! ```text
//! -> [u32 LE len][SSZ RequestHeader][content_length body bytes]
//! <- [u32 LE len][SSZ ResponseHeader][content_length body bytes]
//! ```

use crate::request::ApiRequest;
use crate::response::{PacketResponse, ResponseError};
use crate::router::{Aborted, Router};
use fsbridge_proto::{decode_request_header, read_header, validate_request_header, ErrorKind};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "fsbridge-server";

/// Errors that end a connection or the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("SSZ decode error: {0}")]
    SszDecode(String),

    #[error("response error: {0}")]
    Response(#[from] ResponseError),

    #[error(transparent)]
    Aborted(#[from] Aborted),
}

/// Filesystem bridge server bound to a Unix socket path
pub struct BridgeServer {
    socket_path: PathBuf,
    router: Arc<Router>,
}

impl BridgeServer {
    pub fn new<P: AsRef<Path>>(socket_path: P, router: Router) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            router: Arc::new(router),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket, replacing a stale socket file if one exists
    pub fn bind(&self) -> Result<UnixListener, ServerError> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        let listener = UnixListener::bind(&self.socket_path)?;
        info!(
            component = COMPONENT,
            socket = %self.socket_path.display(),
            "listening"
        );
        Ok(listener)
    }

    /// Accept connections until the listener fails
    pub fn serve(&self, listener: UnixListener) -> Result<(), ServerError> {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!(component = COMPONENT, error = %e, "accept failed");
                    return Err(e.into());
                }
            };

            let router = Arc::clone(&self.router);
            thread::spawn(move || {
                debug!(component = COMPONENT, "connection accepted");
                match serve_connection(&router, stream) {
                    Ok(()) => debug!(component = COMPONENT, "connection closed"),
                    Err(e) => warn!(component = COMPONENT, error = %e, "connection dropped"),
                }
            });
        }
        Ok(())
    }

    pub fn run(&self) -> Result<(), ServerError> {
        let listener = self.bind()?;
        self.serve(listener)
    }
}

fn serve_connection(router: &Router, stream: UnixStream) -> Result<(), ServerError> {
    let reader = BufReader::new(stream.try_clone()?);
    let writer = BufWriter::new(stream);
    handle_connection(router, reader, writer)
}

/// Serve sequential exchanges until the peer closes the stream.
///
/// Returns `Ok(())` on a clean close at a packet boundary. Any error means
/// the connection is no longer usable.
pub fn handle_connection<R: Read, W: Write>(
    router: &Router,
    mut reader: R,
    mut writer: W,
) -> Result<(), ServerError> {
    while let Some(header_bytes) = read_header(&mut reader)? {
        let header = match decode_request_header(&header_bytes) {
            Ok(header) => header,
            Err(e) => {
                // Without a header there is no body length to skip.
                let message = format!("undecodable request header: {}", e);
                PacketResponse::new(&mut writer).send_error(ErrorKind::MalformedFrame, &message)?;
                writer.flush()?;
                return Err(ServerError::SszDecode(message));
            }
        };

        let (endpoint, content_type) = match validate_request_header(&header) {
            Ok(routing) => routing,
            Err(e) => {
                debug!(component = COMPONENT, error = %e, "rejected request header");
                io::copy(&mut (&mut reader).take(header.content_length), &mut io::sink())?;
                let mut response = PacketResponse::new(&mut writer);
                response.send_error(ErrorKind::InvalidArgument, &e.to_string())?;
                response.finish()?;
                continue;
            }
        };

        let mut request =
            ApiRequest::new(endpoint, content_type, header.content_length, &mut reader);
        let mut response = PacketResponse::new(&mut writer);
        let outcome = router.dispatch(&mut request, &mut response);

        if let Err(aborted) = outcome {
            // Push out whatever was already written so the peer sees the short body.
            let _ = writer.flush();
            return Err(aborted.into());
        }

        let skipped = request.drain()?;
        if skipped > 0 {
            debug!(component = COMPONENT, %endpoint, skipped, "drained unread request body");
        }
    }

    writer.flush()?;
    Ok(())
}
