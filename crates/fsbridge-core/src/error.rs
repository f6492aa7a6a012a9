// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for fsbridge core

use fsbridge_proto::{ErrorKind, FrameError};
use std::io;
use std::path::Path;

/// Core filesystem error type
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("No such file found at \"{0}\"")]
    NotFound(String),
    #[error("malformed framed block: {0}")]
    MalformedFrame(#[from] FrameError),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl FsError {
    /// Wire-level kind used when reporting this error to the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound(_) => ErrorKind::NotFound,
            FsError::MalformedFrame(FrameError::Io(_)) => ErrorKind::IoFailure,
            // The frame itself split cleanly; only its metadata is bad.
            FsError::MalformedFrame(FrameError::InvalidJson(_) | FrameError::InvalidUtf8(_)) => {
                ErrorKind::InvalidArgument
            }
            FsError::MalformedFrame(_) => ErrorKind::MalformedFrame,
            FsError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            FsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            FsError::Io(_) => ErrorKind::IoFailure,
        }
    }

    pub fn not_found(path: &Path) -> Self {
        FsError::NotFound(path.display().to_string())
    }

    /// Classify an I/O error raised while operating on `path`
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FsError::not_found(path),
            io::ErrorKind::PermissionDenied => {
                FsError::PermissionDenied(format!("{}: {}", path.display(), err))
            }
            _ => FsError::Io(err),
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;
