// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! One handler per endpoint
//!
//! A handler decodes its parameters, runs exactly one filesystem operation
//! and writes exactly one terminal response.

use crate::request::ApiRequest;
use crate::response::{PacketResponse, ResponseError};
use fsbridge_core::{FsBridge, FsError};
use fsbridge_proto::{Endpoint, PathParams, ReadParams, WriteParams};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("response failed: {0}")]
    Response(#[from] ResponseError),
}

impl From<fsbridge_proto::FrameError> for HandlerError {
    fn from(err: fsbridge_proto::FrameError) -> Self {
        HandlerError::Fs(FsError::from(err))
    }
}

pub type HandlerResult = Result<(), HandlerError>;

pub trait Handler: Send + Sync {
    fn endpoint(&self) -> Endpoint;

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult;
}

/// The handler serving `endpoint`
pub fn handler_for(endpoint: Endpoint) -> &'static dyn Handler {
    match endpoint {
        Endpoint::Type => &TypeHandler,
        Endpoint::Size => &SizeHandler,
        Endpoint::Exists => &ExistsHandler,
        Endpoint::Mkdir => &MkdirHandler,
        Endpoint::Remove => &RemoveHandler,
        Endpoint::Read => &ReadHandler,
        Endpoint::Write => &WriteHandler,
        Endpoint::Append => &AppendHandler,
        Endpoint::Truncate => &TruncateHandler,
    }
}

pub struct TypeHandler;

impl Handler for TypeHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Type
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let path = request.read_as_string()?;
        let file_type = bridge.get_type(&path)?;
        response.send_text(&file_type.code().to_string())?;
        Ok(())
    }
}

pub struct SizeHandler;

impl Handler for SizeHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Size
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let path = request.read_as_string()?;
        let size = bridge.get_size(&path)?;
        response.send_text(&size.to_string())?;
        Ok(())
    }
}

pub struct ExistsHandler;

impl Handler for ExistsHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Exists
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let path = request.read_as_string()?;
        let exists = bridge.exists(&path)?;
        response.send_text(&exists.to_string())?;
        Ok(())
    }
}

pub struct MkdirHandler;

impl Handler for MkdirHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Mkdir
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let params: PathParams = request.read_as_json()?;
        let created = bridge.mkdir(&params.path, params.recursive)?;
        response.send_text(&created.to_string())?;
        Ok(())
    }
}

pub struct RemoveHandler;

impl Handler for RemoveHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Remove
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let params: PathParams = request.read_as_json()?;
        let removed = bridge.delete(&params.path, params.recursive)?;
        response.send_text(&removed.to_string())?;
        Ok(())
    }
}

pub struct ReadHandler;

impl Handler for ReadHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Read
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let params: ReadParams = request.read_as_json()?;
        let sent = bridge.read(&params.path, params.length, params.offset, response)?;
        debug!(path = %params.path, sent, "read streamed");
        Ok(())
    }
}

pub struct WriteHandler;

impl Handler for WriteHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Write
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let mut block = request.framed_block()?;
        let params: WriteParams = block.metadata_json()?;
        let payload_length = block.payload_length();
        let written = bridge.write(&params.path, params.offset, block.payload(), payload_length)?;
        response.send_text(&written.to_string())?;
        Ok(())
    }
}

pub struct AppendHandler;

impl Handler for AppendHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Append
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let mut block = request.framed_block()?;
        let path = block.metadata_str()?.to_string();
        let payload_length = block.payload_length();
        let written = bridge.append(&path, block.payload(), payload_length)?;
        response.send_text(&written.to_string())?;
        Ok(())
    }
}

pub struct TruncateHandler;

impl Handler for TruncateHandler {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Truncate
    }

    fn execute(
        &self,
        bridge: &FsBridge,
        request: &mut ApiRequest<'_>,
        response: &mut PacketResponse<'_>,
    ) -> HandlerResult {
        let mut block = request.framed_block()?;
        let path = block.metadata_str()?.to_string();
        let payload_length = block.payload_length();
        bridge.truncate(&path, block.payload(), payload_length)?;
        response.send_text("true")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_endpoint_has_its_own_handler() {
        for endpoint in Endpoint::ALL {
            assert_eq!(handler_for(endpoint).endpoint(), endpoint);
        }
    }
}
