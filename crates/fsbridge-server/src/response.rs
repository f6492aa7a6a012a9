// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Outgoing response with a single terminal write
//!
//! A response is either one complete body (`send_*`) or a declared stream
//! (`begin_stream` + `push_data`) whose chunks must add up to the declared
//! length. Anything written after the terminal response is rejected.

use fsbridge_core::ChunkSink;
use fsbridge_proto::messages::{STATUS_BAD_REQUEST, STATUS_OK};
use fsbridge_proto::{write_header, ContentType, ErrorBody, ErrorKind, ResponseHeader};
use std::io::{self, Write};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("a terminal response was already written")]
    AlreadyCommitted,

    #[error("no stream was declared")]
    NotStreaming,

    #[error("pushing {attempted} more bytes overflows the declared length {declared} ({pushed} already sent)")]
    Overflow {
        declared: u64,
        pushed: u64,
        attempted: u64,
    },

    #[error("stream ended after {pushed} of {declared} declared bytes")]
    Incomplete { declared: u64, pushed: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ResponseError> for io::Error {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Pending,
    Streaming { declared: u64, pushed: u64 },
    Complete,
}

/// Response writer bound to one request/response exchange
pub struct PacketResponse<'a> {
    stream: &'a mut dyn Write,
    state: State,
}

impl<'a> PacketResponse<'a> {
    pub fn new(stream: &'a mut dyn Write) -> Self {
        Self {
            stream,
            state: State::Pending,
        }
    }

    /// Whether response headers have been written
    pub fn is_committed(&self) -> bool {
        self.state != State::Pending
    }

    /// Whether the exchange has a complete terminal response
    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    /// 200 `text/plain` scalar response
    pub fn send_text(&mut self, text: &str) -> Result<(), ResponseError> {
        self.send_body(STATUS_OK, ContentType::PlainText, text.as_bytes())
    }

    /// 400 structured error response
    pub fn send_error(&mut self, kind: ErrorKind, message: &str) -> Result<(), ResponseError> {
        let body = ErrorBody::new(kind, message).to_json_bytes();
        self.send_body(STATUS_BAD_REQUEST, ContentType::Json, &body)
    }

    /// Write a complete response in one step
    pub fn send_body(
        &mut self,
        status: u16,
        content_type: ContentType,
        body: &[u8],
    ) -> Result<(), ResponseError> {
        self.begin_stream(status, content_type, body.len() as u64)?;
        if !body.is_empty() {
            self.push_data(body)?;
        }
        Ok(())
    }

    /// Write headers declaring a body of exactly `content_length` bytes
    pub fn begin_stream(
        &mut self,
        status: u16,
        content_type: ContentType,
        content_length: u64,
    ) -> Result<(), ResponseError> {
        if self.state != State::Pending {
            return Err(ResponseError::AlreadyCommitted);
        }

        write_header(
            &mut *self.stream,
            &ResponseHeader::new(status, content_type, content_length),
        )?;
        trace!(status, content_length, "response headers written");

        self.state = if content_length == 0 {
            State::Complete
        } else {
            State::Streaming {
                declared: content_length,
                pushed: 0,
            }
        };
        Ok(())
    }

    pub fn push_data(&mut self, chunk: &[u8]) -> Result<(), ResponseError> {
        let (declared, pushed) = match self.state {
            State::Streaming { declared, pushed } => (declared, pushed),
            State::Complete => return Err(ResponseError::AlreadyCommitted),
            State::Pending => return Err(ResponseError::NotStreaming),
        };

        let attempted = chunk.len() as u64;
        if pushed + attempted > declared {
            return Err(ResponseError::Overflow {
                declared,
                pushed,
                attempted,
            });
        }

        self.stream.write_all(chunk)?;
        let pushed = pushed + attempted;
        self.state = if pushed == declared {
            State::Complete
        } else {
            State::Streaming { declared, pushed }
        };
        Ok(())
    }

    /// Check that a terminal response was fully written and flush it
    pub fn finish(&mut self) -> Result<(), ResponseError> {
        match self.state {
            State::Complete => {
                self.stream.flush()?;
                Ok(())
            }
            State::Streaming { declared, pushed } => {
                Err(ResponseError::Incomplete { declared, pushed })
            }
            State::Pending => Err(ResponseError::NotStreaming),
        }
    }
}

impl ChunkSink for PacketResponse<'_> {
    fn declare(
        &mut self,
        status: u16,
        content_type: ContentType,
        content_length: u64,
    ) -> io::Result<()> {
        Ok(self.begin_stream(status, content_type, content_length)?)
    }

    fn push(&mut self, chunk: &[u8]) -> io::Result<()> {
        Ok(self.push_data(chunk)?)
    }

    fn send_empty(&mut self) -> io::Result<()> {
        Ok(self.send_body(STATUS_OK, ContentType::Binary, &[])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsbridge_proto::{decode_ssz, read_header};
    use std::io::Cursor;

    fn parse(wire: Vec<u8>) -> (ResponseHeader, Vec<u8>) {
        let mut cursor = Cursor::new(wire);
        let header_bytes = read_header(&mut cursor).unwrap().unwrap();
        let header: ResponseHeader = decode_ssz(&header_bytes).unwrap();
        let pos = cursor.position() as usize;
        let body = cursor.into_inner()[pos..].to_vec();
        (header, body)
    }

    #[test]
    fn test_text_response() {
        let mut wire = Vec::new();
        let mut response = PacketResponse::new(&mut wire);
        response.send_text("true").unwrap();
        response.finish().unwrap();

        let (header, body) = parse(wire);
        assert_eq!(header.status, STATUS_OK);
        assert_eq!(header.content_type, b"text/plain");
        assert_eq!(body, b"true");
    }

    #[test]
    fn test_second_terminal_response_is_rejected() {
        let mut wire = Vec::new();
        let mut response = PacketResponse::new(&mut wire);
        response.send_text("1").unwrap();
        assert!(matches!(
            response.send_text("2"),
            Err(ResponseError::AlreadyCommitted)
        ));
    }

    #[test]
    fn test_stream_must_match_declared_length() {
        let mut wire = Vec::new();
        let mut response = PacketResponse::new(&mut wire);
        response.begin_stream(STATUS_OK, ContentType::Binary, 4).unwrap();
        response.push_data(b"ab").unwrap();

        assert!(matches!(
            response.finish(),
            Err(ResponseError::Incomplete {
                declared: 4,
                pushed: 2
            })
        ));
        assert!(matches!(
            response.push_data(b"cde"),
            Err(ResponseError::Overflow { .. })
        ));

        response.push_data(b"cd").unwrap();
        response.finish().unwrap();
    }

    #[test]
    fn test_push_without_declaration() {
        let mut wire = Vec::new();
        let mut response = PacketResponse::new(&mut wire);
        assert!(matches!(
            response.push_data(b"x"),
            Err(ResponseError::NotStreaming)
        ));
        assert!(!response.is_committed());
    }

    #[test]
    fn test_error_response_body() {
        let mut wire = Vec::new();
        let mut response = PacketResponse::new(&mut wire);
        response
            .send_error(ErrorKind::NotFound, "No such file found at \"/x\"")
            .unwrap();

        let (header, body) = parse(wire);
        assert_eq!(header.status, STATUS_BAD_REQUEST);
        let error = ErrorBody::from_json_bytes(&body).unwrap();
        assert_eq!(error.error_kind(), Some(ErrorKind::NotFound));
    }
}
