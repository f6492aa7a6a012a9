// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Packet envelope and error payloads for the local transport
//!
//! Every packet on the socket is `[u32 LE header length][SSZ header][body]`.
//! Headers carry the body length so bodies can be streamed without framing
//! of their own.

use crate::endpoint::{ContentType, Endpoint};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Error domain reported in every error body
pub const ERROR_DOMAIN: &str = "fsbridge";

/// Request header preceding the raw request body
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct RequestHeader {
    /// Endpoint route, e.g. `/file/read`
    pub endpoint: Vec<u8>,
    /// Content type tag, see [`ContentType::tag`]
    pub content_type: u8,
    /// Exact number of body bytes following the header
    pub content_length: u64,
}

impl RequestHeader {
    pub fn new(endpoint: Endpoint, content_type: ContentType, content_length: u64) -> Self {
        Self {
            endpoint: endpoint.as_path().as_bytes().to_vec(),
            content_type: content_type.tag(),
            content_length,
        }
    }
}

/// Response header; the body is streamed after it
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ResponseHeader {
    pub status: u16,
    /// MIME type of the body
    pub content_type: Vec<u8>,
    /// Declared body length; the streamed chunks sum to exactly this
    pub content_length: u64,
}

impl ResponseHeader {
    pub fn new(status: u16, content_type: ContentType, content_length: u64) -> Self {
        Self {
            status,
            content_type: content_type.mime().as_bytes().to_vec(),
            content_length,
        }
    }

    pub fn ok(content_type: ContentType, content_length: u64) -> Self {
        Self::new(STATUS_OK, content_type, content_length)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Wire-level error taxonomy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    MalformedFrame,
    PermissionDenied,
    IoFailure,
    InvalidArgument,
}

impl ErrorKind {
    pub fn code(&self) -> u32 {
        match self {
            ErrorKind::NotFound => 1,
            ErrorKind::MalformedFrame => 2,
            ErrorKind::PermissionDenied => 3,
            ErrorKind::IoFailure => 4,
            ErrorKind::InvalidArgument => 5,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ErrorKind::NotFound),
            2 => Some(ErrorKind::MalformedFrame),
            3 => Some(ErrorKind::PermissionDenied),
            4 => Some(ErrorKind::IoFailure),
            5 => Some(ErrorKind::InvalidArgument),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MalformedFrame => "MalformedFrame",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailure => "IOFailure",
            ErrorKind::InvalidArgument => "InvalidArgument",
        }
    }
}

/// JSON body of an error response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub domain: String,
    pub code: u32,
    pub kind: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            domain: ERROR_DOMAIN.to_string(),
            code: kind.code(),
            kind: kind.tag().to_string(),
            message: message.into(),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_code(self.code)
    }

    pub fn to_json_bytes(&self) -> Vec<u8> {
        // Serializing plain strings and integers cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
