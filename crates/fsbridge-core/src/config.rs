// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Bridge configuration
//!
//! Values are layered as: built-in defaults < TOML file < `FSBRIDGE_*`
//! environment variables. Command-line flags are applied on top by the
//! daemon binary. The resolved configuration is read-only while serving.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default per-iteration transfer buffer size
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/fsbridge.sock";

/// Prefix for environment overrides, e.g. `FSBRIDGE_CHUNK_SIZE`
pub const ENV_PREFIX: &str = "FSBRIDGE";

/// Transfer engine settings injected into every data-bearing operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct TransferConfig {
    /// Upper bound on bytes moved per read/write iteration
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TransferConfig {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

/// Full daemon configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    #[serde(flatten)]
    pub transfer: TransferConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            transfer: TransferConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from an optional TOML file plus the environment
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("socket_path", DEFAULT_SOCKET_PATH)?
            .set_default("chunk_size", DEFAULT_CHUNK_SIZE as u64)?;

        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Toml).required(true),
            );
        }

        let built = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let resolved: BridgeConfig = built.try_deserialize()?;
        resolved.validate()?;
        Ok(resolved)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.transfer.chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_PATH)
}
