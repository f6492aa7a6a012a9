// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Chunked transfer engine
//!
//! Moves file content through a single buffer of at most `chunk_size` bytes,
//! in both directions:
//!
//! - ingress ([`copy_inbound`]): request payload -> file
//! - egress ([`copy_outbound`]): file window -> declared-length response stream
//!
//! Neither direction is transactional. Bytes already written to a file or
//! pushed to a response stay there when a later chunk fails.

use crate::error::{FsError, FsResult};
use fsbridge_proto::messages::STATUS_OK;
use fsbridge_proto::{ContentType, READ_TO_END};
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::{debug, trace};

/// Receiving end of an egress transfer (normally the response stream)
pub trait ChunkSink {
    /// Declare status, content type and total length before any data
    fn declare(
        &mut self,
        status: u16,
        content_type: ContentType,
        content_length: u64,
    ) -> io::Result<()>;

    /// Push one chunk of the declared body
    fn push(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Complete the exchange with an empty success body
    fn send_empty(&mut self) -> io::Result<()>;
}

/// The `[offset, offset + length)` byte range selected for a read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadWindow {
    pub offset: u64,
    pub length: u64,
}

impl ReadWindow {
    /// Clip a requested read against the actual file size.
    ///
    /// `desired_length == -1` selects everything from `offset` to end of file.
    /// The result always satisfies `offset + length <= file_size`, except that
    /// an offset past end of file yields an empty window at that offset.
    pub fn resolve(desired_length: i64, offset: i64, file_size: u64) -> FsResult<Self> {
        if offset < 0 {
            return Err(FsError::InvalidArgument(format!(
                "offset must not be negative (got {})",
                offset
            )));
        }
        if desired_length < READ_TO_END {
            return Err(FsError::InvalidArgument(format!(
                "length must be -1 or non-negative (got {})",
                desired_length
            )));
        }

        let offset = offset as u64;
        let mut length = if desired_length == READ_TO_END {
            file_size
        } else {
            (desired_length as u64).min(file_size)
        };

        let end = offset.saturating_add(length);
        if end > file_size {
            length = length.saturating_sub(end - file_size);
        }

        Ok(Self { offset, length })
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Clamp the configured chunk size so a small transfer is never over-buffered
pub fn clamp_chunk_size(chunk_size: usize, content_length: u64) -> FsResult<usize> {
    if chunk_size == 0 {
        return Err(FsError::InvalidArgument(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    Ok(usize::try_from(content_length).map_or(chunk_size, |len| chunk_size.min(len)))
}

/// Copy up to `content_length` bytes from `source` into a sink opened on demand.
///
/// The sink is opened only when there is something to write. End of stream
/// on `source` ends the copy early; the returned count is the number of
/// bytes actually written, which is then less than `content_length`.
pub fn copy_inbound<R, W, F>(
    source: &mut R,
    open_sink: F,
    content_length: u64,
    chunk_size: usize,
) -> FsResult<u64>
where
    R: Read + ?Sized,
    W: Write,
    F: FnOnce() -> FsResult<W>,
{
    if content_length == 0 {
        return Ok(0);
    }

    let chunk_size = clamp_chunk_size(chunk_size, content_length)?;
    let mut sink = open_sink()?;
    let mut buffer = vec![0u8; chunk_size];
    let mut total_read: u64 = 0;

    while total_read < content_length {
        let remaining = content_length - total_read;
        let want = if remaining < chunk_size as u64 {
            remaining as usize
        } else {
            chunk_size
        };

        let read = match source.read(&mut buffer[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        sink.write_all(&buffer[..read])?;
        total_read += read as u64;
        trace!(read, total_read, content_length, "ingress chunk");
    }

    sink.flush()?;

    if total_read < content_length {
        debug!(
            total_read,
            content_length, "ingress source ended before declared length"
        );
    }

    Ok(total_read)
}

/// Stream a window of a file to `sink`.
///
/// The window is resolved against `file_size` first. An empty window sends an
/// empty response without opening the source. Otherwise the source is opened,
/// positioned at the window offset, and the full window length is declared
/// before the first chunk is pushed.
///
/// A source that ends before the declared length is reported as an I/O
/// failure; by then the response is already committed.
pub fn copy_outbound<R, F, S>(
    open_source: F,
    sink: &mut S,
    desired_length: i64,
    offset: i64,
    file_size: u64,
    chunk_size: usize,
) -> FsResult<u64>
where
    R: Read + Seek,
    F: FnOnce() -> FsResult<R>,
    S: ChunkSink + ?Sized,
{
    let window = ReadWindow::resolve(desired_length, offset, file_size)?;
    debug!(
        offset = window.offset,
        length = window.length,
        file_size,
        "resolved read window"
    );

    if window.is_empty() {
        sink.send_empty()?;
        return Ok(0);
    }

    let chunk_size = clamp_chunk_size(chunk_size, window.length)?;
    let mut source = open_source()?;
    if window.offset > 0 {
        source.seek(SeekFrom::Start(window.offset))?;
    }

    sink.declare(STATUS_OK, ContentType::Binary, window.length)?;

    let mut buffer = vec![0u8; chunk_size];
    let mut total_pushed: u64 = 0;

    while total_pushed < window.length {
        let remaining = window.length - total_pushed;
        let want = if remaining < chunk_size as u64 {
            remaining as usize
        } else {
            chunk_size
        };

        let read = match source.read(&mut buffer[..want]) {
            Ok(0) => {
                return Err(FsError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "source ended after {} of {} declared bytes",
                        total_pushed, window.length
                    ),
                )));
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        sink.push(&buffer[..read])?;
        total_pushed += read as u64;
        trace!(read, total_pushed, "egress chunk");
    }

    Ok(total_pushed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Records everything an egress transfer does to its sink
    #[derive(Default)]
    struct RecordingSink {
        declared: Option<(u16, ContentType, u64)>,
        chunks: Vec<Vec<u8>>,
        empty: bool,
    }

    impl ChunkSink for RecordingSink {
        fn declare(&mut self, status: u16, content_type: ContentType, len: u64) -> io::Result<()> {
            assert!(self.chunks.is_empty(), "declared after data was pushed");
            self.declared = Some((status, content_type, len));
            Ok(())
        }

        fn push(&mut self, chunk: &[u8]) -> io::Result<()> {
            assert!(self.declared.is_some(), "pushed before declaring");
            self.chunks.push(chunk.to_vec());
            Ok(())
        }

        fn send_empty(&mut self) -> io::Result<()> {
            self.empty = true;
            Ok(())
        }
    }

    /// Reader that hands out at most `step` bytes per call
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_window_read_to_end() {
        let window = ReadWindow::resolve(-1, 0, 17).unwrap();
        assert_eq!(window, ReadWindow { offset: 0, length: 17 });
    }

    #[test]
    fn test_window_clipped_by_offset() {
        let window = ReadWindow::resolve(10, 12, 16).unwrap();
        assert_eq!(window.length, 4);

        let window = ReadWindow::resolve(2, 1, 16).unwrap();
        assert_eq!(window, ReadWindow { offset: 1, length: 2 });
    }

    #[test]
    fn test_window_offset_past_end_is_empty() {
        let window = ReadWindow::resolve(-1, 40, 16).unwrap();
        assert!(window.is_empty());
    }

    #[test]
    fn test_window_rejects_negative_arguments() {
        assert!(matches!(
            ReadWindow::resolve(-1, -3, 16),
            Err(FsError::InvalidArgument(_))
        ));
        assert!(matches!(
            ReadWindow::resolve(-2, 0, 16),
            Err(FsError::InvalidArgument(_))
        ));
    }

    /// Reader that yields `data` and then fails
    struct FailingAfter<'a> {
        data: &'a [u8],
    }

    impl Read for FailingAfter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Sink that accepts `accept` chunks and then fails like a closed peer
    struct ClosingSink {
        accept: usize,
        chunks: Vec<Vec<u8>>,
    }

    impl ChunkSink for ClosingSink {
        fn declare(&mut self, _status: u16, _content_type: ContentType, _len: u64) -> io::Result<()> {
            Ok(())
        }

        fn push(&mut self, chunk: &[u8]) -> io::Result<()> {
            if self.chunks.len() == self.accept {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.chunks.push(chunk.to_vec());
            Ok(())
        }

        fn send_empty(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_inbound_zero_length_never_opens_sink() {
        let mut source = Cursor::new(b"ignored".to_vec());
        let written = copy_inbound(
            &mut source,
            || -> FsResult<Vec<u8>> { panic!("sink opened for an empty transfer") },
            0,
            8,
        )
        .unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_inbound_stops_at_declared_length() {
        let mut source = Cursor::new(b"0123456789TRAILING".to_vec());
        let mut out = Vec::new();
        let sink = &mut out;
        let written = copy_inbound(&mut source, move || Ok(sink), 10, 3).unwrap();
        assert_eq!(written, 10);
        assert_eq!(out, b"0123456789");
    }

    #[test]
    fn test_inbound_short_source_reports_actual_bytes() {
        let mut source = Cursor::new(b"abc".to_vec());
        let mut out = Vec::new();
        let sink = &mut out;
        let written = copy_inbound(&mut source, move || Ok(sink), 10, 4).unwrap();
        assert_eq!(written, 3);
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_inbound_handles_partial_reads() {
        let data = b"partial reads must not leave stale bytes behind";
        let mut source = Trickle { data, step: 5 };
        let mut out = Vec::new();
        let sink = &mut out;
        let written = copy_inbound(&mut source, move || Ok(sink), data.len() as u64, 8).unwrap();
        assert_eq!(written, data.len() as u64);
        assert_eq!(out, data);
    }

    #[test]
    fn test_inbound_source_failure_keeps_written_chunks() {
        let mut source = FailingAfter { data: b"abcdef" };
        let mut out = Vec::new();
        let sink = &mut out;

        let result = copy_inbound(&mut source, move || Ok(sink), 12, 3);

        match result {
            Err(FsError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected an I/O error, got {:?}", other),
        }
        assert_eq!(out, b"abcdef");
    }

    #[test]
    fn test_inbound_rejects_zero_chunk_size() {
        let mut source = Cursor::new(b"abc".to_vec());
        let mut out = Vec::new();
        let sink = &mut out;
        assert!(copy_inbound(&mut source, move || Ok(sink), 3, 0).is_err());
    }

    #[test]
    fn test_outbound_streams_exact_window() {
        let data = b"Hello Test File!".to_vec();
        let mut sink = RecordingSink::default();

        let pushed = copy_outbound(|| Ok(Cursor::new(data.clone())), &mut sink, 5, 6, 16, 2)
            .unwrap();

        assert_eq!(pushed, 5);
        assert_eq!(sink.declared, Some((STATUS_OK, ContentType::Binary, 5)));
        let sizes: Vec<usize> = sink.chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(sink.chunks.concat(), b"Test ");
    }

    #[test]
    fn test_outbound_empty_window_does_not_open_source() {
        let mut sink = RecordingSink::default();
        let pushed = copy_outbound(
            || -> FsResult<Cursor<Vec<u8>>> { panic!("source opened for an empty window") },
            &mut sink,
            -1,
            0,
            0,
            16,
        )
        .unwrap();

        assert_eq!(pushed, 0);
        assert!(sink.empty);
        assert!(sink.declared.is_none());
    }

    #[test]
    fn test_outbound_short_source_is_an_error_after_declaring() {
        let mut sink = RecordingSink::default();
        let result = copy_outbound(
            || Ok(Cursor::new(b"abc".to_vec())),
            &mut sink,
            -1,
            0,
            10,
            4,
        );

        assert!(matches!(result, Err(FsError::Io(_))));
        assert_eq!(sink.declared, Some((STATUS_OK, ContentType::Binary, 10)));
        assert_eq!(sink.chunks.concat(), b"abc");
    }

    #[test]
    fn test_outbound_sink_failure_stops_the_transfer() {
        let data = b"0123456789".to_vec();
        let mut sink = ClosingSink {
            accept: 2,
            chunks: Vec::new(),
        };

        let result = copy_outbound(|| Ok(Cursor::new(data.clone())), &mut sink, -1, 0, 10, 3);

        match result {
            Err(FsError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected an I/O error, got {:?}", other),
        }
        assert_eq!(sink.chunks.concat(), b"012345");
    }
}
