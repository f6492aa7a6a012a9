// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request dispatch and error conversion

use crate::handlers::{handler_for, HandlerError};
use crate::request::ApiRequest;
use crate::response::{PacketResponse, ResponseError};
use fsbridge_core::FsBridge;
use fsbridge_proto::Endpoint;
use thiserror::Error;
use tracing::{debug, warn};

/// The exchange cannot be completed; the connection must be closed
#[derive(Error, Debug)]
#[error("{endpoint} aborted after response was committed: {reason}")]
pub struct Aborted {
    pub endpoint: Endpoint,
    pub reason: String,
}

/// Routes requests to handlers over a shared [`FsBridge`]
#[derive(Clone, Debug)]
pub struct Router {
    bridge: FsBridge,
}

impl Router {
    pub fn new(bridge: FsBridge) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &FsBridge {
        &self.bridge
    }

    /// Run the handler for `request` and guarantee one terminal response.
    ///
    /// Filesystem failures before anything was written become a structured
    /// error response. Failures after the response was committed cannot be
    /// reported in-band and are returned as [`Aborted`].
    pub fn dispatch(
        &self,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> Result<(), Aborted> {
        let endpoint = request.endpoint();
        let handler = handler_for(endpoint);
        debug!(%endpoint, content_length = request.content_length(), "dispatching");

        let abort = |reason: String| Aborted { endpoint, reason };

        match handler.execute(&self.bridge, request, response) {
            Ok(()) => {}
            Err(HandlerError::Fs(err)) if !response.is_committed() => {
                debug!(%endpoint, kind = err.kind().tag(), error = %err, "operation failed");
                response
                    .send_error(err.kind(), &err.to_string())
                    .map_err(|e| abort(e.to_string()))?;
            }
            Err(err) => {
                warn!(%endpoint, error = %err, "aborting committed response");
                return Err(abort(err.to_string()));
            }
        }

        response.finish().map_err(|e: ResponseError| abort(e.to_string()))
    }
}
