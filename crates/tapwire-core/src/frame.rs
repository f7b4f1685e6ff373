//! On-disk frame codec for recorded packets.
//!
//! Each recorded message is stored as one length-prefixed frame. The layout
//! is little-endian throughout with no alignment padding:
//!
//! ```text
//! offset        size  field
//! 0             4     frame_length   (u32; total frame bytes incl. this field)
//! 4             8     connection_id  (u64)
//! 12            L1    local          (NUL-terminated "address:port")
//! 12+L1         L2    remote         (NUL-terminated "address:port")
//! 12+L1+L2      8     timestamp_ms   (u64; ms since the Unix epoch)
//! +8            8     order          (u64)
//! +8            M     message        (raw wire payload; self-describing)
//! ```
//!
//! The byte layout is the integration contract between the recorder, the
//! reader, and external replay tooling; it must stay stable.

use std::io::Read;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};

use crate::message::Message;
use crate::{Error, Result};

/// Frames above this size are rejected as corrupt (64 MiB).
pub const MAX_FRAME_LEN: u32 = 1 << 26;

/// Frame bytes before the message payload, excluding the two endpoint
/// strings and their terminators.
const FIXED_FIELDS_LEN: usize = 4 + 8 + 8 + 8;

/// One observed wire message plus its recording metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Identifier of the session that produced the message.
    pub connection_id: u64,
    /// "address:port" of the server-side socket.
    pub local: String,
    /// "address:port" of the peer socket.
    pub remote: String,
    /// Observation time; truncated to millisecond resolution on the wire.
    pub timestamp: DateTime<Utc>,
    /// Position of this packet within its recording, starting at 1.
    pub order: u64,
    /// The recorded wire message.
    pub message: Message,
}

impl Packet {
    /// Total size of this packet's on-disk frame in bytes.
    #[must_use]
    pub fn frame_len(&self) -> usize {
        FIXED_FIELDS_LEN + self.local.len() + 1 + self.remote.len() + 1 + self.message.len()
    }

    /// Append this packet's frame to `buf`.
    ///
    /// The length prefix is written as zero and patched once the rest of the
    /// frame is in place.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        let start = buf.len();

        buf.put_u32_le(0);
        buf.put_u64_le(self.connection_id);
        buf.put_slice(self.local.as_bytes());
        buf.put_u8(0);
        buf.put_slice(self.remote.as_bytes());
        buf.put_u8(0);
        buf.put_u64_le(self.timestamp.timestamp_millis() as u64);
        buf.put_u64_le(self.order);
        buf.put_slice(self.message.as_bytes());

        let frame_len = (buf.len() - start) as u32;
        buf[start..start + 4].copy_from_slice(&frame_len.to_le_bytes());
    }
}

/// Read one frame from `reader`.
///
/// Returns `Ok(None)` on clean EOF at a frame boundary. `scratch` holds the
/// frame body and is reused across calls, so a decode loop allocates at most
/// once per high-water mark.
///
/// # Errors
///
/// - `PacketTooLarge` if the length prefix exceeds [`MAX_FRAME_LEN`]
/// - `Truncated` if the input ends mid-frame or the declared length cannot
///   hold the fixed fields
/// - `MalformedString` if an endpoint string is missing its NUL terminator
/// - `MalformedMessage` if the embedded message disagrees with the frame
pub fn read_packet<R: Read>(reader: &mut R, scratch: &mut Vec<u8>) -> Result<Option<Packet>> {
    let mut prefix = [0u8; 4];
    if !read_full(reader, &mut prefix, true)? {
        return Ok(None);
    }

    let frame_len = u32::from_le_bytes(prefix);
    if frame_len > MAX_FRAME_LEN {
        return Err(Error::PacketTooLarge { len: frame_len });
    }
    if (frame_len as usize) < FIXED_FIELDS_LEN + 2 {
        return Err(Error::Truncated);
    }

    scratch.resize(frame_len as usize - 4, 0);
    read_full(reader, scratch, false)?;

    let mut body: &[u8] = scratch;
    let connection_id = take_u64_le(&mut body)?;
    let local = take_cstring(&mut body)?;
    let remote = take_cstring(&mut body)?;
    let timestamp_ms = take_u64_le(&mut body)?;
    let order = take_u64_le(&mut body)?;

    let timestamp = DateTime::from_timestamp_millis(timestamp_ms as i64)
        .ok_or_else(|| Error::malformed_message(format!("timestamp {timestamp_ms} out of range")))?;

    let message = Message::from_bytes(bytes::Bytes::copy_from_slice(body))?;

    Ok(Some(Packet { connection_id, local, remote, timestamp, order, message }))
}

/// Fill `buf` from `reader`, retrying on interruption.
///
/// With `eof_ok`, a clean EOF before the first byte returns `Ok(false)`;
/// EOF after the first byte is always `Truncated`.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8], eof_ok: bool) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                if eof_ok && filled == 0 {
                    return Ok(false);
                }
                return Err(Error::Truncated);
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(true)
}

fn take_u64_le(body: &mut &[u8]) -> Result<u64> {
    if body.len() < 8 {
        return Err(Error::Truncated);
    }
    let (head, rest) = body.split_at(8);
    let mut raw = [0u8; 8];
    raw.copy_from_slice(head);
    *body = rest;
    Ok(u64::from_le_bytes(raw))
}

fn take_cstring(body: &mut &[u8]) -> Result<String> {
    let nul = body.iter().position(|&b| b == 0).ok_or(Error::MalformedString)?;
    let (head, rest) = body.split_at(nul);
    let value = std::str::from_utf8(head).map_err(|_| Error::MalformedString)?.to_string();
    *body = &rest[1..];
    Ok(value)
}
