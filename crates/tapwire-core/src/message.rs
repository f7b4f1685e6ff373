//! The opaque wire message observed by the recorder.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Length of the standard message header in bytes.
pub const HEADER_LEN: usize = 16;

/// Opcode of the framed multi-section message format.
///
/// Messages with any other opcode are surfaced downstream as `"legacy"`.
pub const OP_MSG: i32 = 2013;

/// A single wire-protocol message.
///
/// The payload is opaque to the recorder; only the 16-byte header is ever
/// interpreted. The header carries four little-endian `i32` fields: the total
/// message length (including the header itself), the request id, the id of
/// the request this message responds to (zero for requests), and the opcode.
///
/// Backed by [`Bytes`], so cloning a message shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    bytes: Bytes,
}

impl Message {
    /// Wrap a raw message buffer.
    ///
    /// # Errors
    ///
    /// Returns `MalformedMessage` if the buffer is shorter than a header or
    /// its embedded length field disagrees with the buffer length.
    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::malformed_message(format!(
                "message shorter than its header: {} bytes",
                bytes.len()
            )));
        }

        let declared = (&bytes[0..4]).get_i32_le();
        if declared as i64 != bytes.len() as i64 {
            return Err(Error::malformed_message(format!(
                "message length field says {declared} bytes but buffer holds {}",
                bytes.len()
            )));
        }

        Ok(Self { bytes })
    }

    /// Compose a message from header fields and a body.
    #[must_use]
    pub fn build(request_id: i32, response_to: i32, op_code: i32, body: &[u8]) -> Self {
        let len = HEADER_LEN + body.len();
        let mut buf = BytesMut::with_capacity(len);
        buf.put_i32_le(len as i32);
        buf.put_i32_le(request_id);
        buf.put_i32_le(response_to);
        buf.put_i32_le(op_code);
        buf.put_slice(body);
        Self { bytes: buf.freeze() }
    }

    /// Total message size in bytes, header included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the message holds no bytes.
    ///
    /// Never true for a validated message; present for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The header's total-length field.
    #[must_use]
    pub fn message_len(&self) -> i32 {
        self.header_i32(0)
    }

    /// The header's request id.
    #[must_use]
    pub fn request_id(&self) -> i32 {
        self.header_i32(4)
    }

    /// The id of the request this message responds to; zero for requests.
    #[must_use]
    pub fn response_to(&self) -> i32 {
        self.header_i32(8)
    }

    /// The header's opcode.
    #[must_use]
    pub fn op_code(&self) -> i32 {
        self.header_i32(12)
    }

    /// The bytes after the header.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }

    /// The entire message, header included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn header_i32(&self, offset: usize) -> i32 {
        (&self.bytes[offset..offset + 4]).get_i32_le()
    }
}
