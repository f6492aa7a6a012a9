// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Identifier to local path resolution

use crate::error::{FsError, FsResult};
use std::path::PathBuf;
use url::Url;

/// Maps a caller-supplied identifier (URI or bare path) to a local path
#[cfg_attr(test, mockall::automock)]
pub trait PathResolver: Send + Sync {
    fn resolve(&self, identifier: &str) -> FsResult<PathBuf>;
}

/// Resolver for `file://` URIs and plain filesystem paths
#[derive(Clone, Copy, Debug, Default)]
pub struct FileUriResolver;

impl PathResolver for FileUriResolver {
    fn resolve(&self, identifier: &str) -> FsResult<PathBuf> {
        if identifier.is_empty() {
            return Err(FsError::InvalidArgument("empty path".to_string()));
        }

        if !identifier.contains("://") && !identifier.starts_with("file:") {
            return Ok(PathBuf::from(identifier));
        }

        let url = Url::parse(identifier).map_err(|e| {
            FsError::InvalidArgument(format!("invalid URI \"{}\": {}", identifier, e))
        })?;

        if url.scheme() != "file" {
            return Err(FsError::InvalidArgument(format!(
                "unsupported URI scheme \"{}\"",
                url.scheme()
            )));
        }

        url.to_file_path().map_err(|_| {
            FsError::InvalidArgument(format!("URI \"{}\" is not a local file path", identifier))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_path_passes_through() {
        let path = FileUriResolver.resolve("/var/data/notes.txt").unwrap();
        assert_eq!(path, PathBuf::from("/var/data/notes.txt"));
    }

    #[test]
    fn test_file_uri_is_decoded() {
        let path = FileUriResolver.resolve("file:///var/data/my%20notes.txt").unwrap();
        assert_eq!(path, PathBuf::from("/var/data/my notes.txt"));

        let root = FileUriResolver.resolve("file:///").unwrap();
        assert_eq!(root, PathBuf::from("/"));
    }

    #[test]
    fn test_foreign_scheme_is_rejected() {
        assert!(matches!(
            FileUriResolver.resolve("https://example.com/a"),
            Err(FsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_identifier_is_rejected() {
        assert!(matches!(
            FileUriResolver.resolve(""),
            Err(FsError::InvalidArgument(_))
        ));
    }
}
