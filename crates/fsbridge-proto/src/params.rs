// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON operation descriptors carried by structured requests

use serde::{Deserialize, Serialize};

/// Sentinel read length meaning "from offset to end of file"
pub const READ_TO_END: i64 = -1;

/// Parameters for `mkdir` and `remove`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathParams {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

/// Parameters for `read`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadParams {
    pub path: String,
    #[serde(default = "read_to_end")]
    pub length: i64,
    #[serde(default)]
    pub offset: i64,
}

/// Header parameters for `write` (payload follows in the framed block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteParams {
    pub path: String,
    #[serde(default)]
    pub offset: i64,
}

fn read_to_end() -> i64 {
    READ_TO_END
}
