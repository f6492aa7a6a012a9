// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! fsbridge protocol: wire types shared by the server and its clients
//!
//! This crate defines the framed parameter block codec, the JSON operation
//! descriptors, the endpoint table, and the SSZ packet envelope used on the
//! local transport.

pub mod endpoint;
pub mod framing;
pub mod messages;
pub mod packet;
pub mod params;
pub mod validation;

// Re-export key types
pub use endpoint::{ContentType, Endpoint};
pub use framing::{FrameError, FramedBlock, LENGTH_PREFIX_SIZE, decode_framed_block, encode_framed_block};
pub use messages::{ErrorBody, ErrorKind, RequestHeader, ResponseHeader, ERROR_DOMAIN};
pub use packet::{read_header, write_header};
pub use params::{PathParams, ReadParams, WriteParams, READ_TO_END};
pub use validation::*;

/// Encode a message using SSZ
pub fn encode_ssz(data: &impl ssz::Encode) -> Vec<u8> {
    data.as_ssz_bytes()
}

/// Decode a message from SSZ bytes
pub fn decode_ssz<T: ssz::Decode>(data: &[u8]) -> Result<T, ssz::DecodeError> {
    T::from_ssz_bytes(data)
}
