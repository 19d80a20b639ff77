//! Protocol codec
//!
//! Encoding and decoding functions for the binary wire protocol.
//!
//! ## Request Header
//! ```text
//! [0]     magic (0x80)
//! [1]     opcode
//! [2..4]  key length
//! [4]     extras length
//! [5]     data type (0)
//! [6..8]  vbucket id (0)
//! [8..12] total body length (extras + key + body)
//! [12..16] opaque
//! [16..24] cas
//! ```
//!
//! Response headers share the layout, with magic 0x81 and the status in
//! bytes 6..8. Extras, key and body follow the header in that order.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{HammerError, Result};
use super::{RequestFrame, ResponseFrame};

/// Fixed header size for requests and responses
pub const HEADER_LEN: usize = 24;

/// Magic byte opening every request
pub const REQ_MAGIC: u8 = 0x80;

/// Magic byte opening every response
pub const RES_MAGIC: u8 = 0x81;

/// Maximum total body length accepted from the wire (16 MB)
pub const MAX_BODY_LEN: u32 = 16 * 1024 * 1024;

// =============================================================================
// Header
// =============================================================================

/// A parsed 24-byte frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub opcode: u8,
    pub key_len: u16,
    pub extras_len: u8,
    /// Status for responses, vbucket id for requests
    pub status: u16,
    pub total_body_len: u32,
    pub opaque: u32,
    pub cas: u64,
}

impl FrameHeader {
    /// Parse a response header, rejecting anything without the response magic
    /// or with a body longer than `MAX_BODY_LEN`
    pub fn parse_response(bytes: &[u8; HEADER_LEN]) -> Result<Self> {
        Self::parse(bytes, RES_MAGIC)
    }

    /// Parse a request header, rejecting anything without the request magic
    pub fn parse_request(bytes: &[u8; HEADER_LEN]) -> Result<Self> {
        Self::parse(bytes, REQ_MAGIC)
    }

    fn parse(bytes: &[u8; HEADER_LEN], magic: u8) -> Result<Self> {
        if bytes[0] != magic {
            return Err(HammerError::BadMagic {
                expected: magic,
                found: bytes[0],
            });
        }

        let header = Self {
            opcode: bytes[1],
            key_len: u16::from_be_bytes([bytes[2], bytes[3]]),
            extras_len: bytes[4],
            status: u16::from_be_bytes([bytes[6], bytes[7]]),
            total_body_len: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            opaque: u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            cas: u64::from_be_bytes([
                bytes[16], bytes[17], bytes[18], bytes[19],
                bytes[20], bytes[21], bytes[22], bytes[23],
            ]),
        };

        // Validate the length arithmetic up front
        header.body_len()?;
        if header.total_body_len > MAX_BODY_LEN {
            return Err(HammerError::Protocol(format!(
                "Body too large: {} bytes (max {})",
                header.total_body_len, MAX_BODY_LEN
            )));
        }
        Ok(header)
    }

    /// Value length: total body minus key and extras
    pub fn body_len(&self) -> Result<u32> {
        self.total_body_len
            .checked_sub(u32::from(self.key_len))
            .and_then(|rest| rest.checked_sub(u32::from(self.extras_len)))
            .ok_or(HammerError::LengthUnderflow {
                total: self.total_body_len,
                key: self.key_len,
                extras: self.extras_len,
            })
    }
}

/// Write a header into `buf`
#[allow(clippy::too_many_arguments)]
fn put_header(
    buf: &mut BytesMut,
    magic: u8,
    opcode: u8,
    key: &[u8],
    extras: &[u8],
    body: &[u8],
    status: u16,
    opaque: u32,
    cas: u64,
) {
    assert!(key.len() <= u16::MAX as usize, "key length {} exceeds u16", key.len());
    assert!(extras.len() <= u8::MAX as usize, "extras length {} exceeds u8", extras.len());
    let total = extras.len() + key.len() + body.len();
    assert!(total <= u32::MAX as usize, "total body length {} exceeds u32", total);

    // 0
    buf.put_u8(magic);
    buf.put_u8(opcode);
    buf.put_u16(key.len() as u16);
    // 4
    buf.put_u8(extras.len() as u8);
    buf.put_u8(0);
    buf.put_u16(status);
    // 8
    buf.put_u32(total as u32);
    // 12
    buf.put_u32(opaque);
    // 16
    buf.put_u64(cas);
    // The rest
    buf.put_slice(extras);
    buf.put_slice(key);
    buf.put_slice(body);
}

/// Split a complete frame into (header, extras, key, body)
fn split_frame(bytes: &[u8], magic: u8) -> Result<(FrameHeader, Bytes, Bytes, Bytes)> {
    if bytes.len() < HEADER_LEN {
        return Err(HammerError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_LEN,
            bytes.len()
        )));
    }

    let mut raw = [0u8; HEADER_LEN];
    raw.copy_from_slice(&bytes[..HEADER_LEN]);
    let header = FrameHeader::parse(&raw, magic)?;

    let total_len = HEADER_LEN + header.total_body_len as usize;
    if bytes.len() < total_len {
        return Err(HammerError::Protocol(format!(
            "Incomplete body: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let extras_end = HEADER_LEN + header.extras_len as usize;
    let key_end = extras_end + header.key_len as usize;
    let extras = Bytes::copy_from_slice(&bytes[HEADER_LEN..extras_end]);
    let key = Bytes::copy_from_slice(&bytes[extras_end..key_end]);
    let body = Bytes::copy_from_slice(&bytes[key_end..total_len]);

    Ok((header, extras, key, body))
}

/// Read the parts following a header: extras, then key, then body
fn read_parts<R: Read>(reader: &mut R, header: &FrameHeader) -> Result<(Bytes, Bytes, Bytes)> {
    let body_len = header.body_len()?;
    let extras = read_part(reader, header.extras_len as usize)?;
    let key = read_part(reader, header.key_len as usize)?;
    let body = read_part(reader, body_len as usize)?;
    Ok((extras, key, body))
}

fn read_part<R: Read>(reader: &mut R, len: usize) -> Result<Bytes> {
    if len == 0 {
        return Ok(Bytes::new());
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(Bytes::from(buf))
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request frame to bytes
///
/// # Panics
/// If the key, extras or total body lengths do not fit their header fields.
pub fn encode_request(request: &RequestFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + request.total_body_len());
    put_header(
        &mut buf,
        REQ_MAGIC,
        request.opcode,
        &request.key,
        &request.extras,
        &request.body,
        0,
        request.opaque,
        request.cas,
    );
    buf.freeze()
}

/// Decode a complete request frame from bytes
pub fn decode_request(bytes: &[u8]) -> Result<RequestFrame> {
    let (header, extras, key, body) = split_frame(bytes, REQ_MAGIC)?;
    Ok(RequestFrame {
        opcode: header.opcode,
        key,
        extras,
        body,
        opaque: header.opaque,
        cas: header.cas,
    })
}

/// Write a request to a stream and flush it
pub fn write_request<W: Write>(writer: &mut W, request: &RequestFrame) -> Result<()> {
    writer.write_all(&encode_request(request))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete request from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<RequestFrame> {
    let mut raw = [0u8; HEADER_LEN];
    reader.read_exact(&mut raw)?;
    let header = FrameHeader::parse_request(&raw)?;
    let (extras, key, body) = read_parts(reader, &header)?;

    Ok(RequestFrame {
        opcode: header.opcode,
        key,
        extras,
        body,
        opaque: header.opaque,
        cas: header.cas,
    })
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response frame to bytes
///
/// # Panics
/// If the key, extras or total body lengths do not fit their header fields.
pub fn encode_response(response: &ResponseFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + response.total_body_len());
    put_header(
        &mut buf,
        RES_MAGIC,
        response.opcode,
        &response.key,
        &response.extras,
        &response.body,
        response.status,
        response.opaque,
        response.cas,
    );
    buf.freeze()
}

/// Decode a complete response frame from bytes
pub fn decode_response(bytes: &[u8]) -> Result<ResponseFrame> {
    let (header, extras, key, body) = split_frame(bytes, RES_MAGIC)?;
    Ok(response_from_parts(header, extras, key, body))
}

/// Write a response to a stream and flush it
pub fn write_response<W: Write>(writer: &mut W, response: &ResponseFrame) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
///
/// Blocks until the header and all declared extras, key and body bytes
/// have arrived. A bad magic byte or an inconsistent length is returned
/// before any further bytes are consumed.
pub fn read_response<R: Read>(reader: &mut R) -> Result<ResponseFrame> {
    let mut raw = [0u8; HEADER_LEN];
    reader.read_exact(&mut raw)?;
    let header = FrameHeader::parse_response(&raw)?;
    let (extras, key, body) = read_parts(reader, &header)?;
    Ok(response_from_parts(header, extras, key, body))
}

fn response_from_parts(header: FrameHeader, extras: Bytes, key: Bytes, body: Bytes) -> ResponseFrame {
    ResponseFrame {
        opcode: header.opcode,
        status: header.status,
        key,
        extras,
        body,
        opaque: header.opaque,
        cas: header.cas,
    }
}
