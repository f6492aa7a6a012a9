// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Length-prefixed header I/O for the socket transport

use crate::validation::{validate_header_length, MAX_HEADER_SIZE};
use std::io::{self, Read, Write};

/// Write `[u32 LE length][SSZ header]`
pub fn write_header<W: Write + ?Sized>(writer: &mut W, header: &impl ssz::Encode) -> io::Result<()> {
    let bytes = crate::encode_ssz(header);
    if bytes.len() > MAX_HEADER_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("encoded header of {} bytes is too large", bytes.len()),
        ));
    }
    writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&bytes)
}

/// Read one length-prefixed header.
///
/// Returns `Ok(None)` when the stream ends cleanly before the first prefix
/// byte; ending anywhere else is `UnexpectedEof`.
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let len = u32::from_le_bytes(prefix) as usize;
    validate_header_length(len).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut header = vec![0u8; len];
    reader.read_exact(&mut header)?;
    Ok(Some(header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{ContentType, Endpoint};
    use crate::messages::RequestHeader;
    use std::io::Cursor;

    #[test]
    fn test_header_round_trip_and_clean_eof() {
        let header = RequestHeader::new(Endpoint::Exists, ContentType::PlainText, 4);
        let mut wire = Vec::new();
        write_header(&mut wire, &header).unwrap();

        let mut cursor = Cursor::new(wire);
        let bytes = read_header(&mut cursor).unwrap().unwrap();
        assert_eq!(crate::decode_ssz::<RequestHeader>(&bytes).unwrap(), header);
        assert!(read_header(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_eof_inside_prefix() {
        let err = read_header(&mut Cursor::new(vec![3u8, 0])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_oversized_header_prefix() {
        let wire = ((MAX_HEADER_SIZE + 1) as u32).to_le_bytes().to_vec();
        let err = read_header(&mut Cursor::new(wire)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
