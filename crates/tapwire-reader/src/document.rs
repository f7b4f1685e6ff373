//! Replay-document construction.
//!
//! Each decoded packet becomes one BSON document shaped for the replay
//! tool: the raw operation (header fields plus the opaque message bytes),
//! the observation time, the traffic direction, and bookkeeping fields the
//! player fills in at playback time.

use bson::spec::BinarySubtype;
use bson::{doc, Binary, Bson, Document};
use bytes::Buf;
use tapwire_core::frame::Packet;
use tapwire_core::message::{Message, OP_MSG};
use tapwire_core::{Error, Result};

/// Seconds between Jan 1 of year 1 (proleptic Gregorian) and the Unix epoch.
///
/// The replay tool stores `seen.sec` as seconds since year 1, the
/// representation used by Go's `time.Time`; this constant converts from
/// Unix-epoch seconds.
pub const UNIX_TO_INTERNAL_EPOCH_OFFSET: i64 =
    (1969 * 365 + 1969 / 4 - 1969 / 100 + 1969 / 400) * 86400;

const FLAG_CHECKSUM_PRESENT: u32 = 1;
const SECTION_BODY: u8 = 0;
const SECTION_DOC_SEQUENCE: u8 = 1;

/// Build the replay document for one recorded packet.
///
/// With `with_op_type`, the document carries an `opType` field: the command
/// name for framed multi-section messages, the literal `"legacy"` for every
/// other opcode.
///
/// # Errors
///
/// Returns `MalformedMessage` if `opType` extraction is requested and the
/// message's command section cannot be parsed.
pub fn replay_document(packet: &Packet, with_op_type: bool) -> Result<Document> {
    let message = &packet.message;

    let mut document = doc! {
        "rawop": {
            "header": {
                "messagelength": message.message_len(),
                "requestid": message.request_id(),
                "responseto": message.response_to(),
                "opcode": message.op_code(),
            },
            "body": Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: message.as_bytes().to_vec(),
            }),
        },
        "seen": {
            "sec": packet.timestamp.timestamp_millis() / 1000 + UNIX_TO_INTERNAL_EPOCH_OFFSET,
            // The replay tool reads this as "within-second order", so the
            // packet's order goes in as a tiebreaker.
            "nsec": packet.order as i32,
        },
    };

    // A reply flows server-to-client, a request client-to-server. Ports are
    // taken after the last ':' so bracketed IPv6 literals work; when either
    // address has no port, both endpoint fields are omitted.
    if let (Some(local), Some(remote)) = (port_of(&packet.local), port_of(&packet.remote)) {
        if message.response_to() != 0 {
            document.insert("srcendpoint", local);
            document.insert("destendpoint", remote);
        } else {
            document.insert("srcendpoint", remote);
            document.insert("destendpoint", local);
        }
    }

    document.insert("order", packet.order as i64);
    document.insert("seenconnectionnum", packet.connection_id as i64);
    document.insert("playedconnectionnum", 0_i64);
    document.insert("generation", 0_i32);

    if with_op_type {
        let op_type = if message.op_code() == OP_MSG {
            command_name(message)?
        } else {
            "legacy".to_string()
        };
        document.insert("opType", op_type);
    }

    Ok(document)
}

/// The substring after the last ':' of an "address:port" string.
fn port_of(endpoint: &str) -> Option<&str> {
    endpoint.rfind(':').map(|idx| &endpoint[idx + 1..])
}

/// Extract the command name from a framed multi-section message.
///
/// The command is the first element key of the kind-0 body section. Kind-1
/// document-sequence sections may precede it; a trailing checksum is skipped
/// when the flag bits announce one.
fn command_name(message: &Message) -> Result<String> {
    let mut body = message.body();
    if body.len() < 4 {
        return Err(Error::malformed_message("message body shorter than its flag word"));
    }
    let flags = body.get_u32_le();

    let trailer = if flags & FLAG_CHECKSUM_PRESENT != 0 { 4 } else { 0 };
    if body.len() < trailer {
        return Err(Error::malformed_message("message body shorter than its checksum"));
    }
    let mut sections = &body[..body.len() - trailer];

    while !sections.is_empty() {
        let kind = sections.get_u8();
        if sections.len() < 4 {
            return Err(Error::malformed_message("message section shorter than its length"));
        }
        let len = (&sections[..4]).get_i32_le() as usize;
        if len < 5 || len > sections.len() {
            return Err(Error::malformed_message(format!("bad message section length {len}")));
        }

        match kind {
            SECTION_BODY => {
                let document = Document::from_reader(&sections[..len])
                    .map_err(|e| Error::malformed_message(e.to_string()))?;
                return document
                    .keys()
                    .next()
                    .cloned()
                    .ok_or_else(|| Error::malformed_message("command document is empty"));
            }
            SECTION_DOC_SEQUENCE => {
                sections = &sections[len..];
            }
            other => {
                return Err(Error::malformed_message(format!("unknown section kind {other}")));
            }
        }
    }

    Err(Error::malformed_message("message carries no body section"))
}
