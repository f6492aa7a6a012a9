// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Endpoint identifiers and content type hints

use std::fmt;

/// Logical filesystem endpoints exposed by the bridge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Type,
    Size,
    Exists,
    Mkdir,
    Remove,
    Read,
    Write,
    Append,
    Truncate,
}

impl Endpoint {
    pub const ALL: [Endpoint; 9] = [
        Endpoint::Type,
        Endpoint::Size,
        Endpoint::Exists,
        Endpoint::Mkdir,
        Endpoint::Remove,
        Endpoint::Read,
        Endpoint::Write,
        Endpoint::Append,
        Endpoint::Truncate,
    ];

    /// Route path used on the wire, e.g. `/file/read`
    pub fn as_path(&self) -> &'static str {
        match self {
            Endpoint::Type => "/file/type",
            Endpoint::Size => "/file/size",
            Endpoint::Exists => "/file/exists",
            Endpoint::Mkdir => "/file/mkdir",
            Endpoint::Remove => "/file/remove",
            Endpoint::Read => "/file/read",
            Endpoint::Write => "/file/write",
            Endpoint::Append => "/file/append",
            Endpoint::Truncate => "/file/truncate",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_path() == path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Content type hint attached to request and response bodies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    PlainText,
    Json,
    Binary,
}

impl ContentType {
    pub fn tag(&self) -> u8 {
        match self {
            ContentType::PlainText => 0,
            ContentType::Json => 1,
            ContentType::Binary => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ContentType::PlainText),
            1 => Some(ContentType::Json),
            2 => Some(ContentType::Binary),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::PlainText => "text/plain",
            ContentType::Json => "application/json",
            ContentType::Binary => "application/octet-stream",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
