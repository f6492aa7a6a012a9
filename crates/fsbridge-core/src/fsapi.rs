// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Filesystem operation set
//!
//! Every operation works on an already-resolved local path. Data-bearing
//! operations take the transfer settings explicitly so one process can serve
//! callers with different chunk sizes.

use crate::config::TransferConfig;
use crate::error::{FsError, FsResult};
use crate::transfer::{copy_inbound, copy_outbound, ChunkSink};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info};

/// Kind of a filesystem entry as reported by `type`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    File = 0,
    Directory = 1,
}

impl FileType {
    /// Numeric code used in `type` responses
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Filesystem primitives exposed over the bridge
pub trait FsApi: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn get_type(&self, path: &Path) -> FsResult<FileType>;

    fn get_size(&self, path: &Path) -> FsResult<u64>;

    /// Create a directory. `Ok(false)` when it already exists or creation
    /// was refused by the filesystem for a non-permission reason.
    fn mkdir(&self, path: &Path, recursive: bool) -> FsResult<bool>;

    /// Remove a file or directory. `Ok(false)` when nothing exists at `path`
    /// or removal was refused by the filesystem for a non-permission reason.
    fn delete(&self, path: &Path, recursive: bool) -> FsResult<bool>;

    /// Append `content_length` bytes from `input` to an existing file
    fn append(
        &self,
        path: &Path,
        input: &mut dyn Read,
        content_length: u64,
        transfer: &TransferConfig,
    ) -> FsResult<u64>;

    /// Overwrite bytes starting at `offset`; writing past the end extends the file
    fn write(
        &self,
        path: &Path,
        offset: i64,
        input: &mut dyn Read,
        content_length: u64,
        transfer: &TransferConfig,
    ) -> FsResult<u64>;

    /// Truncate an existing file to zero and write `content_length` bytes from `input`
    fn truncate(
        &self,
        path: &Path,
        input: &mut dyn Read,
        content_length: u64,
        transfer: &TransferConfig,
    ) -> FsResult<u64>;

    /// Stream a window of the file to `sink`
    fn read(
        &self,
        path: &Path,
        length: i64,
        offset: i64,
        sink: &mut dyn ChunkSink,
        transfer: &TransferConfig,
    ) -> FsResult<u64>;
}

/// [`FsApi`] backed by the host filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    fn metadata(path: &Path) -> FsResult<fs::Metadata> {
        fs::metadata(path).map_err(|e| FsError::from_io(e, path))
    }

    fn require_existing(path: &Path) -> FsResult<()> {
        if !path.exists() {
            return Err(FsError::not_found(path));
        }
        Ok(())
    }
}

impl FsApi for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn get_type(&self, path: &Path) -> FsResult<FileType> {
        let metadata = Self::metadata(path)?;
        if metadata.is_dir() {
            Ok(FileType::Directory)
        } else {
            Ok(FileType::File)
        }
    }

    fn get_size(&self, path: &Path) -> FsResult<u64> {
        Ok(Self::metadata(path)?.len())
    }

    fn mkdir(&self, path: &Path, recursive: bool) -> FsResult<bool> {
        if path.exists() {
            debug!(path = %path.display(), "mkdir target already exists");
            return Ok(false);
        }

        let result = if recursive {
            fs::create_dir_all(path)
        } else {
            fs::create_dir(path)
        };

        match result {
            Ok(()) => {
                info!(path = %path.display(), recursive, "created directory");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(FsError::from_io(e, path))
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "mkdir refused");
                Ok(false)
            }
        }
    }

    fn delete(&self, path: &Path, recursive: bool) -> FsResult<bool> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(FsError::from_io(e, path)),
        };

        let result = if !metadata.is_dir() {
            fs::remove_file(path)
        } else if recursive {
            remove_tree(path)
        } else {
            fs::remove_dir(path)
        };

        match result {
            Ok(()) => {
                info!(path = %path.display(), recursive, "removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(FsError::from_io(e, path))
            }
            Err(e) => {
                debug!(path = %path.display(), recursive, error = %e, "remove refused");
                Ok(false)
            }
        }
    }

    fn append(
        &self,
        path: &Path,
        input: &mut dyn Read,
        content_length: u64,
        transfer: &TransferConfig,
    ) -> FsResult<u64> {
        Self::require_existing(path)?;

        let written = copy_inbound(
            input,
            || {
                OpenOptions::new()
                    .append(true)
                    .open(path)
                    .map_err(|e| FsError::from_io(e, path))
            },
            content_length,
            transfer.chunk_size,
        )?;

        debug!(path = %path.display(), written, "append complete");
        Ok(written)
    }

    fn write(
        &self,
        path: &Path,
        offset: i64,
        input: &mut dyn Read,
        content_length: u64,
        transfer: &TransferConfig,
    ) -> FsResult<u64> {
        if offset < 0 {
            return Err(FsError::InvalidArgument(format!(
                "offset must not be negative (got {})",
                offset
            )));
        }

        let file_size = Self::metadata(path)?.len();
        let offset = offset as u64;
        if offset > file_size {
            return Err(FsError::InvalidArgument(format!(
                "offset {} is past the end of a {} byte file",
                offset, file_size
            )));
        }

        let written = copy_inbound(
            input,
            || {
                let mut file = OpenOptions::new()
                    .write(true)
                    .open(path)
                    .map_err(|e| FsError::from_io(e, path))?;
                file.seek(SeekFrom::Start(offset))?;
                Ok(file)
            },
            content_length,
            transfer.chunk_size,
        )?;

        debug!(path = %path.display(), offset, written, "write complete");
        Ok(written)
    }

    fn truncate(
        &self,
        path: &Path,
        input: &mut dyn Read,
        content_length: u64,
        transfer: &TransferConfig,
    ) -> FsResult<u64> {
        Self::require_existing(path)?;

        let open_truncated = || {
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(path)
                .map_err(|e| FsError::from_io(e, path))
        };

        if content_length == 0 {
            open_truncated()?;
            debug!(path = %path.display(), "truncated to empty");
            return Ok(0);
        }

        let written = copy_inbound(input, open_truncated, content_length, transfer.chunk_size)?;
        debug!(path = %path.display(), written, "truncate complete");
        Ok(written)
    }

    fn read(
        &self,
        path: &Path,
        length: i64,
        offset: i64,
        sink: &mut dyn ChunkSink,
        transfer: &TransferConfig,
    ) -> FsResult<u64> {
        let metadata = Self::metadata(path)?;
        if metadata.is_dir() {
            return Err(FsError::InvalidArgument(format!(
                "\"{}\" is a directory",
                path.display()
            )));
        }

        copy_outbound(
            || File::open(path).map_err(|e| FsError::from_io(e, path)),
            sink,
            length,
            offset,
            metadata.len(),
            transfer.chunk_size,
        )
    }
}

/// Post-order removal of a directory tree. Symlinks are unlinked, never followed.
fn remove_tree(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let child = entry.path();
        if entry.file_type()?.is_dir() {
            remove_tree(&child)?;
        } else {
            fs::remove_file(&child)?;
        }
    }
    fs::remove_dir(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn seeded(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_file_type_codes() {
        assert_eq!(FileType::File.code(), 0);
        assert_eq!(FileType::Directory.code(), 1);
    }

    #[test]
    fn test_type_of_directory_and_file() {
        let dir = TempDir::new().unwrap();
        let file = seeded(&dir, "a.txt", b"x");
        assert_eq!(LocalFs.get_type(dir.path()).unwrap(), FileType::Directory);
        assert_eq!(LocalFs.get_type(&file).unwrap(), FileType::File);
        assert!(matches!(
            LocalFs.get_type(&dir.path().join("missing")),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_mkdir_existing_returns_false() {
        let dir = TempDir::new().unwrap();
        assert!(!LocalFs.mkdir(dir.path(), false).unwrap());
    }

    #[test]
    fn test_mkdir_non_recursive_missing_parent_returns_false() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        assert!(!LocalFs.mkdir(&nested, false).unwrap());
        assert!(LocalFs.mkdir(&nested, true).unwrap());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_delete_missing_returns_false() {
        let dir = TempDir::new().unwrap();
        assert!(!LocalFs.delete(&dir.path().join("nothing"), true).unwrap());
    }

    #[test]
    fn test_delete_non_empty_directory_requires_recursive() {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("inner")).unwrap();
        fs::write(tree.join("inner/leaf.txt"), b"leaf").unwrap();

        assert!(!LocalFs.delete(&tree, false).unwrap());
        assert!(tree.join("inner/leaf.txt").exists());

        assert!(LocalFs.delete(&tree, true).unwrap());
        assert!(!tree.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_recursive_delete_does_not_follow_symlinks() {
        let dir = TempDir::new().unwrap();
        let outside = dir.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("keep.txt"), b"keep").unwrap();

        let tree = dir.path().join("tree");
        fs::create_dir(&tree).unwrap();
        std::os::unix::fs::symlink(&outside, tree.join("link")).unwrap();

        assert!(LocalFs.delete(&tree, true).unwrap());
        assert!(outside.join("keep.txt").exists());
    }

    #[test]
    fn test_write_past_end_extends_file() {
        let dir = TempDir::new().unwrap();
        let file = seeded(&dir, "w.txt", b"abc");
        let config = TransferConfig::with_chunk_size(2);

        let written = LocalFs
            .write(&file, 3, &mut Cursor::new(b"defg".to_vec()), 4, &config)
            .unwrap();
        assert_eq!(written, 4);
        assert_eq!(fs::read(&file).unwrap(), b"abcdefg");
    }

    #[test]
    fn test_write_offset_validation() {
        let dir = TempDir::new().unwrap();
        let file = seeded(&dir, "w.txt", b"abc");
        let config = TransferConfig::default();

        assert!(matches!(
            LocalFs.write(&file, 4, &mut io::empty(), 0, &config),
            Err(FsError::InvalidArgument(_))
        ));
        assert!(matches!(
            LocalFs.write(&file, -1, &mut io::empty(), 0, &config),
            Err(FsError::InvalidArgument(_))
        ));
        assert!(matches!(
            LocalFs.write(&dir.path().join("nope"), 0, &mut io::empty(), 0, &config),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_append_does_not_create_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        let result = LocalFs.append(
            &missing,
            &mut Cursor::new(b"data".to_vec()),
            4,
            &TransferConfig::default(),
        );
        assert!(matches!(result, Err(FsError::NotFound(_))));
        assert!(!missing.exists());
    }

    #[test]
    fn test_truncate_without_content_empties_file() {
        let dir = TempDir::new().unwrap();
        let file = seeded(&dir, "t.txt", b"Initial State!");
        let written = LocalFs
            .truncate(&file, &mut io::empty(), 0, &TransferConfig::default())
            .unwrap();
        assert_eq!(written, 0);
        assert_eq!(fs::metadata(&file).unwrap().len(), 0);
    }

    #[test]
    fn test_read_directory_is_invalid() {
        let dir = TempDir::new().unwrap();

        struct NoSink;
        impl ChunkSink for NoSink {
            fn declare(&mut self, _: u16, _: fsbridge_proto::ContentType, _: u64) -> io::Result<()> {
                unreachable!()
            }
            fn push(&mut self, _: &[u8]) -> io::Result<()> {
                unreachable!()
            }
            fn send_empty(&mut self) -> io::Result<()> {
                unreachable!()
            }
        }

        let result = LocalFs.read(dir.path(), -1, 0, &mut NoSink, &TransferConfig::default());
        assert!(matches!(result, Err(FsError::InvalidArgument(_))));
    }
}
