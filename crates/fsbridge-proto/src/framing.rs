// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Framed parameter block codec
//!
//! Write-class endpoints carry their parameters and their binary payload in a
//! single request body:
//!
//! ```text
//! [u32 big-endian N][N bytes UTF-8 metadata][total - 4 - N bytes of payload]
//! ```
//!
//! The metadata is either a bare path string or a JSON object. The payload is
//! never buffered by the decoder; it is handed back as a bounded reader over
//! the remaining stream.

use serde::de::DeserializeOwned;
use std::io::{self, Read, Take};
use thiserror::Error;

/// Size of the big-endian metadata length prefix
pub const LENGTH_PREFIX_SIZE: u64 = 4;

/// Errors raised while decoding or encoding a framed block
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("framed block of {total} bytes cannot hold a length prefix")]
    MissingPrefix { total: u64 },

    #[error("declared metadata length {declared} exceeds the {available} bytes available")]
    LengthOverflow { declared: u64, available: u64 },

    #[error("stream ended inside the metadata section")]
    Truncated,

    #[error("metadata is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("metadata is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A decoded framed block: owned metadata plus a lazily-read payload
#[derive(Debug)]
pub struct FramedBlock<R> {
    metadata: Vec<u8>,
    payload: Take<R>,
    payload_length: u64,
}

impl<R: Read> FramedBlock<R> {
    /// Raw metadata bytes
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Metadata as UTF-8 text (the bare-path form)
    pub fn metadata_str(&self) -> Result<&str, FrameError> {
        Ok(std::str::from_utf8(&self.metadata)?)
    }

    /// Metadata parsed as a JSON operation descriptor
    pub fn metadata_json<T: DeserializeOwned>(&self) -> Result<T, FrameError> {
        Ok(serde_json::from_slice(&self.metadata)?)
    }

    /// Number of payload bytes declared by the enclosing body
    pub fn payload_length(&self) -> u64 {
        self.payload_length
    }

    /// Reader over the payload; never yields more than `payload_length` bytes
    pub fn payload(&mut self) -> &mut Take<R> {
        &mut self.payload
    }
}

/// Split a framed body of `total_length` bytes into metadata and payload.
///
/// Exactly `4 + N` bytes are consumed from `stream`; the payload is left
/// unread behind the returned [`FramedBlock`].
pub fn decode_framed_block<R: Read>(
    mut stream: R,
    total_length: u64,
) -> Result<FramedBlock<R>, FrameError> {
    if total_length < LENGTH_PREFIX_SIZE {
        return Err(FrameError::MissingPrefix {
            total: total_length,
        });
    }

    let mut prefix = [0u8; LENGTH_PREFIX_SIZE as usize];
    read_section(&mut stream, &mut prefix)?;

    let declared = u64::from(u32::from_be_bytes(prefix));
    let available = total_length - LENGTH_PREFIX_SIZE;
    if declared > available {
        return Err(FrameError::LengthOverflow {
            declared,
            available,
        });
    }

    let mut metadata = vec![0u8; declared as usize];
    read_section(&mut stream, &mut metadata)?;

    let payload_length = available - declared;
    Ok(FramedBlock {
        metadata,
        payload: stream.take(payload_length),
        payload_length,
    })
}

/// Build a framed body from metadata and payload bytes
pub fn encode_framed_block(metadata: &[u8], payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let declared = u32::try_from(metadata.len()).map_err(|_| FrameError::LengthOverflow {
        declared: metadata.len() as u64,
        available: u64::from(u32::MAX),
    })?;

    let mut body = Vec::with_capacity(LENGTH_PREFIX_SIZE as usize + metadata.len() + payload.len());
    body.extend_from_slice(&declared.to_be_bytes());
    body.extend_from_slice(metadata);
    body.extend_from_slice(payload);
    Ok(body)
}

fn read_section<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<(), FrameError> {
    stream.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => FrameError::Truncated,
        _ => FrameError::Io(e),
    })
}
