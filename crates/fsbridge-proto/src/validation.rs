// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Validation of packet headers received on the transport

use crate::endpoint::{ContentType, Endpoint};
use crate::messages::{RequestHeader, ResponseHeader};
use thiserror::Error;

/// Upper bound on an SSZ header; bodies are never counted here
pub const MAX_HEADER_SIZE: usize = 4096;

/// Validation error
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),
    #[error("unknown content type tag: {0}")]
    UnknownContentType(u8),
    #[error("header of {0} bytes exceeds the {MAX_HEADER_SIZE} byte limit")]
    HeaderTooLarge(usize),
    #[error("SSZ decoding failed: {0}")]
    SszDecode(String),
}

/// Reject header lengths that cannot belong to a well-formed packet
pub fn validate_header_length(len: usize) -> Result<(), ValidationError> {
    if len > MAX_HEADER_SIZE {
        return Err(ValidationError::HeaderTooLarge(len));
    }
    Ok(())
}

/// Decode a request header. Routing fields are checked separately by
/// [`validate_request_header`] so a bad route can still be skipped by length.
pub fn decode_request_header(bytes: &[u8]) -> Result<RequestHeader, ValidationError> {
    crate::decode_ssz(bytes).map_err(|e| ValidationError::SszDecode(format!("{:?}", e)))
}

/// Validate a decoded request header against the endpoint table
pub fn validate_request_header(
    header: &RequestHeader,
) -> Result<(Endpoint, ContentType), ValidationError> {
    let route = String::from_utf8_lossy(&header.endpoint);
    let endpoint =
        Endpoint::from_path(&route).ok_or_else(|| ValidationError::UnknownEndpoint(route.to_string()))?;
    let content_type = ContentType::from_tag(header.content_type)
        .ok_or(ValidationError::UnknownContentType(header.content_type))?;
    Ok((endpoint, content_type))
}

/// Decode a response header received by a client
pub fn decode_response_header(bytes: &[u8]) -> Result<ResponseHeader, ValidationError> {
    crate::decode_ssz(bytes).map_err(|e| ValidationError::SszDecode(format!("{:?}", e)))
}
