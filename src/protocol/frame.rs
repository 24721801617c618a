//! Wire frame assembly and parsing
//!
//! ## Wire Format
//!
//! Every frame, request or response, starts with a 24-byte big-endian
//! header followed by extras, key and value:
//!
//! ```text
//! ┌───────────┬───────────┬───────────────┬───────────────┬──────────┐
//! │ Magic (1) │ Opcode(1) │ Key len (2)   │ Extras len(1) │ Type (1) │
//! ├───────────┴───────────┴───────────────┴───────────────┴──────────┤
//! │ Reserved/Status (2)   │ Total body length (4)                    │
//! ├───────────────────────┼──────────────────────────────────────────┤
//! │ Opaque (4)            │ CAS (8)                                  │
//! ├───────────────────────┴──────────────────────────────────────────┤
//! │ Extras ‖ Key ‖ Value  (total body length bytes)                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The 2-byte field at offset 6 carries the partition on requests and the
//! status code on responses. Data type is always zero.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CoralError, Result};

/// Magic byte opening every request frame
pub const MAGIC_REQUEST: u8 = 0x80;

/// Magic byte opening every response frame
pub const MAGIC_RESPONSE: u8 = 0x81;

/// Header size in bytes, both directions
pub const HEADER_SIZE: usize = 24;

/// An outbound request frame, ready to be written to the socket
#[derive(Debug)]
pub struct RequestFrame {
    /// Wire opcode byte
    pub opcode: u8,

    /// Partition (vBucket) routing field; 0 when the request has none
    pub partition: u16,

    /// Client-chosen correlation ID echoed by the server
    pub opaque: u32,

    /// Compare-and-swap token; 0 when unset
    pub cas: u64,

    /// Fixed-length per-opcode metadata
    pub extras: Bytes,

    /// Document key bytes
    pub key: Bytes,

    /// Value body
    pub value: Bytes,
}

impl RequestFrame {
    /// Total body length: extras + key + value
    pub fn total_body_len(&self) -> usize {
        self.extras.len() + self.key.len() + self.value.len()
    }

    /// Serialize the frame into contiguous wire bytes
    pub fn to_bytes(&self) -> Bytes {
        let body_len = self.total_body_len();
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + body_len);

        buf.put_u8(MAGIC_REQUEST);
        buf.put_u8(self.opcode);
        buf.put_u16(self.key.len() as u16);
        buf.put_u8(self.extras.len() as u8);
        buf.put_u8(0); // data type
        buf.put_u16(self.partition);
        buf.put_u32(body_len as u32);
        buf.put_u32(self.opaque);
        buf.put_u64(self.cas);
        buf.put_slice(&self.extras);
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);

        buf.freeze()
    }
}

/// A fully-framed inbound response, parsed but not yet interpreted
#[derive(Debug, Clone)]
pub struct ResponseFrame {
    /// Wire opcode byte echoed by the server
    pub opcode: u8,

    /// Raw server status code
    pub status: u16,

    /// Correlation ID echoed from the request
    pub opaque: u32,

    /// Compare-and-swap token of the affected document
    pub cas: u64,

    /// Fixed-length per-opcode metadata
    pub extras: Bytes,

    /// Response key (STAT streams carry one)
    pub key: Bytes,

    /// Response value body
    pub value: Bytes,
}

/// Parse a request frame from contiguous bytes
///
/// This is the reference reader used by tests to verify byte-exact
/// encoding; it performs full length validation.
pub fn parse_request(bytes: &[u8]) -> Result<RequestFrame> {
    let (magic, opcode, key_len, extras_len, field, body_len, opaque, cas) = parse_header(bytes)?;

    if magic != MAGIC_REQUEST {
        return Err(CoralError::Protocol(format!(
            "Bad request magic: 0x{:02x}",
            magic
        )));
    }

    let (extras, key, value) = split_body(bytes, key_len, extras_len, body_len)?;
    Ok(RequestFrame {
        opcode,
        partition: field,
        opaque,
        cas,
        extras,
        key,
        value,
    })
}

/// Parse a response frame from contiguous bytes
pub fn parse_response(bytes: &[u8]) -> Result<ResponseFrame> {
    let (magic, opcode, key_len, extras_len, field, body_len, opaque, cas) = parse_header(bytes)?;

    if magic != MAGIC_RESPONSE {
        return Err(CoralError::Protocol(format!(
            "Bad response magic: 0x{:02x}",
            magic
        )));
    }

    let (extras, key, value) = split_body(bytes, key_len, extras_len, body_len)?;
    Ok(ResponseFrame {
        opcode,
        status: field,
        opaque,
        cas,
        extras,
        key,
        value,
    })
}

#[allow(clippy::type_complexity)]
fn parse_header(bytes: &[u8]) -> Result<(u8, u8, usize, usize, u16, usize, u32, u64)> {
    if bytes.len() < HEADER_SIZE {
        return Err(CoralError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let magic = header.get_u8();
    let opcode = header.get_u8();
    let key_len = header.get_u16() as usize;
    let extras_len = header.get_u8() as usize;
    let _data_type = header.get_u8();
    let field = header.get_u16();
    let body_len = header.get_u32() as usize;
    let opaque = header.get_u32();
    let cas = header.get_u64();

    Ok((magic, opcode, key_len, extras_len, field, body_len, opaque, cas))
}

fn split_body(
    bytes: &[u8],
    key_len: usize,
    extras_len: usize,
    body_len: usize,
) -> Result<(Bytes, Bytes, Bytes)> {
    if key_len + extras_len > body_len {
        return Err(CoralError::Protocol(format!(
            "Body length {} smaller than extras {} + key {}",
            body_len, extras_len, key_len
        )));
    }
    if bytes.len() < HEADER_SIZE + body_len {
        return Err(CoralError::Protocol(format!(
            "Incomplete body: expected {} bytes, got {}",
            HEADER_SIZE + body_len,
            bytes.len()
        )));
    }

    let mut body = Bytes::copy_from_slice(&bytes[HEADER_SIZE..HEADER_SIZE + body_len]);
    let extras = body.split_to(extras_len);
    let key = body.split_to(key_len);
    Ok((extras, key, body))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request frame to a stream
pub fn write_request<W: Write>(writer: &mut W, frame: &RequestFrame) -> Result<()> {
    writer.write_all(&frame.to_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response frame from a stream
///
/// Blocks until a full frame is received. `max_body_size` bounds the
/// total-body-length the reader will accept; anything larger is a
/// protocol-integrity error.
pub fn read_response<R: Read>(reader: &mut R, max_body_size: usize) -> Result<ResponseFrame> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let body_len = u32::from_be_bytes([header[8], header[9], header[10], header[11]]) as usize;
    if body_len > max_body_size {
        return Err(CoralError::Protocol(format!(
            "Body too large: {} bytes (max {})",
            body_len, max_body_size
        )));
    }

    let mut frame = vec![0u8; HEADER_SIZE + body_len];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    if body_len > 0 {
        reader.read_exact(&mut frame[HEADER_SIZE..])?;
    }

    parse_response(&frame)
}
