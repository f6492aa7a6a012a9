// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Identifier-addressed facade over [`FsApi`]

use crate::config::TransferConfig;
use crate::error::FsResult;
use crate::fsapi::{FileType, FsApi, LocalFs};
use crate::resolver::{FileUriResolver, PathResolver};
use crate::transfer::ChunkSink;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::trace;

/// Resolves caller identifiers and forwards to the filesystem operation set
#[derive(Clone)]
pub struct FsBridge {
    resolver: Arc<dyn PathResolver>,
    fs: Arc<dyn FsApi>,
    transfer: TransferConfig,
}

impl FsBridge {
    pub fn new(
        resolver: Arc<dyn PathResolver>,
        fs: Arc<dyn FsApi>,
        transfer: TransferConfig,
    ) -> Self {
        Self {
            resolver,
            fs,
            transfer,
        }
    }

    /// Host filesystem with `file://` and bare-path identifiers
    pub fn local(transfer: TransferConfig) -> Self {
        Self::new(Arc::new(FileUriResolver), Arc::new(LocalFs), transfer)
    }

    pub fn transfer(&self) -> &TransferConfig {
        &self.transfer
    }

    pub fn resolve(&self, identifier: &str) -> FsResult<PathBuf> {
        let path = self.resolver.resolve(identifier)?;
        trace!(identifier, path = %path.display(), "resolved identifier");
        Ok(path)
    }

    pub fn exists(&self, identifier: &str) -> FsResult<bool> {
        Ok(self.fs.exists(&self.resolve(identifier)?))
    }

    pub fn get_type(&self, identifier: &str) -> FsResult<FileType> {
        self.fs.get_type(&self.resolve(identifier)?)
    }

    pub fn get_size(&self, identifier: &str) -> FsResult<u64> {
        self.fs.get_size(&self.resolve(identifier)?)
    }

    pub fn mkdir(&self, identifier: &str, recursive: bool) -> FsResult<bool> {
        self.fs.mkdir(&self.resolve(identifier)?, recursive)
    }

    pub fn delete(&self, identifier: &str, recursive: bool) -> FsResult<bool> {
        self.fs.delete(&self.resolve(identifier)?, recursive)
    }

    pub fn append(
        &self,
        identifier: &str,
        input: &mut dyn Read,
        content_length: u64,
    ) -> FsResult<u64> {
        let path = self.resolve(identifier)?;
        self.fs
            .append(&path, input, content_length, &self.transfer)
    }

    pub fn write(
        &self,
        identifier: &str,
        offset: i64,
        input: &mut dyn Read,
        content_length: u64,
    ) -> FsResult<u64> {
        let path = self.resolve(identifier)?;
        self.fs
            .write(&path, offset, input, content_length, &self.transfer)
    }

    pub fn truncate(
        &self,
        identifier: &str,
        input: &mut dyn Read,
        content_length: u64,
    ) -> FsResult<u64> {
        let path = self.resolve(identifier)?;
        self.fs
            .truncate(&path, input, content_length, &self.transfer)
    }

    pub fn read(
        &self,
        identifier: &str,
        length: i64,
        offset: i64,
        sink: &mut dyn ChunkSink,
    ) -> FsResult<u64> {
        let path = self.resolve(identifier)?;
        self.fs.read(&path, length, offset, sink, &self.transfer)
    }
}

impl std::fmt::Debug for FsBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBridge")
            .field("transfer", &self.transfer)
            .finish_non_exhaustive()
    }
}
