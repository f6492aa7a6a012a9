// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Incoming request: routing fields plus a bounded body reader

use fsbridge_core::{FsError, FsResult};
use fsbridge_proto::{decode_framed_block, ContentType, Endpoint, FrameError, FramedBlock};
use serde::de::DeserializeOwned;
use std::io::{self, Read, Take};

/// Largest body accepted by `read_as_string` / `read_as_json`
pub const MAX_PARAMETER_BYTES: u64 = 64 * 1024;

/// A request whose body has not been consumed yet.
///
/// The body reader never yields more than `content_length` bytes, so bytes
/// belonging to the next packet on the connection are never touched.
pub struct ApiRequest<'a> {
    endpoint: Endpoint,
    content_type: ContentType,
    content_length: u64,
    body: Take<&'a mut dyn Read>,
}

impl<'a> ApiRequest<'a> {
    pub fn new(
        endpoint: Endpoint,
        content_type: ContentType,
        content_length: u64,
        stream: &'a mut dyn Read,
    ) -> Self {
        Self {
            endpoint,
            content_type,
            content_length,
            body: stream.take(content_length),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Body bytes not yet consumed
    pub fn remaining(&self) -> u64 {
        self.body.limit()
    }

    /// Read the whole body as UTF-8 text (the bare-path parameter form)
    pub fn read_as_string(&mut self) -> FsResult<String> {
        let bytes = self.read_small_body()?;
        String::from_utf8(bytes)
            .map_err(|_| FsError::InvalidArgument("request body is not valid UTF-8".to_string()))
    }

    /// Read the whole body as a JSON operation descriptor
    pub fn read_as_json<T: DeserializeOwned>(&mut self) -> FsResult<T> {
        let bytes = self.read_small_body()?;
        serde_json::from_slice(&bytes).map_err(|e| {
            FsError::InvalidArgument(format!(
                "invalid {} parameters: {}",
                self.endpoint, e
            ))
        })
    }

    /// Split the body as a framed parameter block; the payload stays unread
    pub fn framed_block(&mut self) -> Result<FramedBlock<&mut Take<&'a mut dyn Read>>, FrameError> {
        let total = self.content_length;
        decode_framed_block(&mut self.body, total)
    }

    /// Discard whatever is left of the body
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(&mut self.body, &mut io::sink())
    }

    fn read_small_body(&mut self) -> FsResult<Vec<u8>> {
        if self.content_length > MAX_PARAMETER_BYTES {
            return Err(FsError::InvalidArgument(format!(
                "{} parameters of {} bytes exceed the {} byte limit",
                self.endpoint, self.content_length, MAX_PARAMETER_BYTES
            )));
        }

        let mut bytes = Vec::with_capacity(self.content_length as usize);
        self.body.read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < self.content_length {
            return Err(FsError::Io(io::Error::from(io::ErrorKind::UnexpectedEof)));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsbridge_proto::{encode_framed_block, WriteParams};
    use std::io::Cursor;

    #[test]
    fn test_string_body_stops_at_content_length() {
        let mut stream = Cursor::new(b"/tmp/aNEXT".to_vec());
        let mut request = ApiRequest::new(Endpoint::Size, ContentType::PlainText, 6, &mut stream);
        assert_eq!(request.read_as_string().unwrap(), "/tmp/a");
        assert_eq!(request.remaining(), 0);
    }

    #[test]
    fn test_invalid_json_is_invalid_argument() {
        let mut stream = Cursor::new(b"{path".to_vec());
        let mut request = ApiRequest::new(Endpoint::Mkdir, ContentType::Json, 5, &mut stream);
        let result: FsResult<fsbridge_proto::PathParams> = request.read_as_json();
        assert!(matches!(result, Err(FsError::InvalidArgument(_))));
    }

    #[test]
    fn test_framed_block_and_drain() {
        let body = encode_framed_block(br#"{"path":"/w","offset":1}"#, b"payload").unwrap();
        let len = body.len() as u64;
        let mut stream = Cursor::new(body);
        let mut request = ApiRequest::new(Endpoint::Write, ContentType::Binary, len, &mut stream);

        {
            let block = request.framed_block().unwrap();
            let params: WriteParams = block.metadata_json().unwrap();
            assert_eq!(params.offset, 1);
            assert_eq!(block.payload_length(), 7);
        }

        assert_eq!(request.drain().unwrap(), 7);
        assert_eq!(request.remaining(), 0);
    }

    #[test]
    fn test_oversized_parameters_rejected() {
        let mut stream = io::empty();
        let mut request = ApiRequest::new(
            Endpoint::Exists,
            ContentType::PlainText,
            MAX_PARAMETER_BYTES + 1,
            &mut stream,
        );
        assert!(matches!(
            request.read_as_string(),
            Err(FsError::InvalidArgument(_))
        ));
    }
}
