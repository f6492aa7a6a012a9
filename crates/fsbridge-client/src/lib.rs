// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Blocking client for the fsbridge socket protocol.
//!
//! Wraps the length-prefixed SSZ envelope and exposes one typed method per
//! endpoint. Error responses from the server surface as
//! [`ClientError::Remote`].

use fsbridge_core::FileType;
use fsbridge_proto::{
    decode_response_header, encode_framed_block, read_header, write_header, ContentType, Endpoint,
    ErrorBody, ErrorKind, FrameError, PathParams, ReadParams, RequestHeader, ResponseHeader,
    ValidationError, WriteParams, READ_TO_END,
};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid response header: {0}")]
    Header(#[from] ValidationError),

    #[error("failed to frame request: {0}")]
    Frame(#[from] FrameError),

    #[error("failed to encode parameters: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server closed the connection")]
    Disconnected,

    #[error("response body ended after {received} of {declared} bytes")]
    ShortBody { declared: u64, received: u64 },

    #[error("{kind:?} ({code}): {message}")]
    Remote {
        kind: Option<ErrorKind>,
        code: u32,
        message: String,
    },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// Wire error kind for [`ClientError::Remote`]
    pub fn remote_kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Remote { kind, .. } => *kind,
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Socket options applied on connect
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientConfig {
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

/// A successful response
#[derive(Clone, Debug)]
pub struct Response {
    pub header: ResponseHeader,
    pub body: Vec<u8>,
}

impl Response {
    pub fn text(&self) -> ClientResult<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|_| ClientError::UnexpectedResponse("body is not UTF-8".to_string()))
    }
}

/// Connection to an fsbridge server
pub struct BridgeClient {
    reader: BufReader<UnixStream>,
    writer: BufWriter<UnixStream>,
}

impl BridgeClient {
    pub fn connect(socket_path: &Path) -> ClientResult<Self> {
        Self::connect_with(socket_path, &ClientConfig::default())
    }

    pub fn connect_with(socket_path: &Path, config: &ClientConfig) -> ClientResult<Self> {
        let stream = UnixStream::connect(socket_path)?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one raw request and read the full response.
    ///
    /// Non-success statuses are returned as [`ClientError::Remote`].
    pub fn call(
        &mut self,
        endpoint: Endpoint,
        content_type: ContentType,
        body: &[u8],
    ) -> ClientResult<Response> {
        self.send(endpoint, content_type, body)?;
        let header = self.read_response_header()?;

        let mut body = Vec::new();
        self.read_body(&header, &mut body)?;
        check_status(&header, &body)?;
        Ok(Response { header, body })
    }

    pub fn file_type(&mut self, path: &str) -> ClientResult<FileType> {
        let response = self.call(Endpoint::Type, ContentType::PlainText, path.as_bytes())?;
        match response.text()? {
            "0" => Ok(FileType::File),
            "1" => Ok(FileType::Directory),
            other => Err(ClientError::UnexpectedResponse(format!(
                "unknown file type code {:?}",
                other
            ))),
        }
    }

    pub fn size(&mut self, path: &str) -> ClientResult<u64> {
        let response = self.call(Endpoint::Size, ContentType::PlainText, path.as_bytes())?;
        parse_count(&response)
    }

    pub fn exists(&mut self, path: &str) -> ClientResult<bool> {
        let response = self.call(Endpoint::Exists, ContentType::PlainText, path.as_bytes())?;
        parse_bool(&response)
    }

    pub fn mkdir(&mut self, path: &str, recursive: bool) -> ClientResult<bool> {
        let params = serde_json::to_vec(&PathParams {
            path: path.to_string(),
            recursive,
        })?;
        let response = self.call(Endpoint::Mkdir, ContentType::Json, &params)?;
        parse_bool(&response)
    }

    pub fn remove(&mut self, path: &str, recursive: bool) -> ClientResult<bool> {
        let params = serde_json::to_vec(&PathParams {
            path: path.to_string(),
            recursive,
        })?;
        let response = self.call(Endpoint::Remove, ContentType::Json, &params)?;
        parse_bool(&response)
    }

    /// Read a window into memory. `length == -1` reads to end of file.
    pub fn read(&mut self, path: &str, length: i64, offset: i64) -> ClientResult<Vec<u8>> {
        let mut out = Vec::new();
        self.read_into(path, length, offset, &mut out)?;
        Ok(out)
    }

    pub fn read_all(&mut self, path: &str) -> ClientResult<Vec<u8>> {
        self.read(path, READ_TO_END, 0)
    }

    /// Stream a window into `sink` without buffering it; returns bytes received
    pub fn read_into<W: Write + ?Sized>(
        &mut self,
        path: &str,
        length: i64,
        offset: i64,
        sink: &mut W,
    ) -> ClientResult<u64> {
        let params = serde_json::to_vec(&ReadParams {
            path: path.to_string(),
            length,
            offset,
        })?;
        self.send(Endpoint::Read, ContentType::Json, &params)?;
        let header = self.read_response_header()?;

        if !header.is_success() {
            let mut body = Vec::new();
            self.read_body(&header, &mut body)?;
            check_status(&header, &body)?;
        }
        self.read_body(&header, sink)
    }

    pub fn write(&mut self, path: &str, offset: i64, data: &[u8]) -> ClientResult<u64> {
        let metadata = serde_json::to_vec(&WriteParams {
            path: path.to_string(),
            offset,
        })?;
        let body = encode_framed_block(&metadata, data)?;
        let response = self.call(Endpoint::Write, ContentType::Binary, &body)?;
        parse_count(&response)
    }

    pub fn append(&mut self, path: &str, data: &[u8]) -> ClientResult<u64> {
        let body = encode_framed_block(path.as_bytes(), data)?;
        let response = self.call(Endpoint::Append, ContentType::Binary, &body)?;
        parse_count(&response)
    }

    /// Empty the file, then write `content` if given
    pub fn truncate(&mut self, path: &str, content: Option<&[u8]>) -> ClientResult<bool> {
        let body = encode_framed_block(path.as_bytes(), content.unwrap_or_default())?;
        let response = self.call(Endpoint::Truncate, ContentType::Binary, &body)?;
        parse_bool(&response)
    }

    fn send(&mut self, endpoint: Endpoint, content_type: ContentType, body: &[u8]) -> ClientResult<()> {
        trace!(%endpoint, len = body.len(), "sending request");
        let header = RequestHeader::new(endpoint, content_type, body.len() as u64);
        write_header(&mut self.writer, &header)?;
        self.writer.write_all(body)?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_response_header(&mut self) -> ClientResult<ResponseHeader> {
        let bytes = read_header(&mut self.reader)?.ok_or(ClientError::Disconnected)?;
        Ok(decode_response_header(&bytes)?)
    }

    fn read_body<W: Write + ?Sized>(
        &mut self,
        header: &ResponseHeader,
        sink: &mut W,
    ) -> ClientResult<u64> {
        let declared = header.content_length;
        let received = io::copy(&mut (&mut self.reader).take(declared), sink)?;
        if received < declared {
            return Err(ClientError::ShortBody { declared, received });
        }
        Ok(received)
    }
}

fn check_status(header: &ResponseHeader, body: &[u8]) -> ClientResult<()> {
    if header.is_success() {
        return Ok(());
    }
    match ErrorBody::from_json_bytes(body) {
        Ok(error) => Err(ClientError::Remote {
            kind: error.error_kind(),
            code: error.code,
            message: error.message,
        }),
        Err(_) => Err(ClientError::UnexpectedResponse(format!(
            "status {} with body {:?}",
            header.status,
            String::from_utf8_lossy(body)
        ))),
    }
}

fn parse_bool(response: &Response) -> ClientResult<bool> {
    match response.text()? {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ClientError::UnexpectedResponse(format!(
            "expected a boolean, got {:?}",
            other
        ))),
    }
}

fn parse_count(response: &Response) -> ClientResult<u64> {
    let text = response.text()?;
    text.parse()
        .map_err(|_| ClientError::UnexpectedResponse(format!("expected a count, got {:?}", text)))
}
