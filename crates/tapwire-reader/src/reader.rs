//! Streaming decoder from recording files to replay documents.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use bson::{doc, Document};
use tapwire_core::frame::read_packet;
use tapwire_core::{Error, Result};

use crate::document::replay_document;

/// Decode every frame in `path` into replay documents, `opType` included.
///
/// A nonexistent file is not an error: it logs a warning and yields an empty
/// Vec, so callers can poll for recordings that were never started.
///
/// # Errors
///
/// Propagates frame decode errors and `opType` extraction failures; either
/// aborts the whole read.
pub fn recorded_documents(path: &Path) -> Result<Vec<Document>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Recording file does not exist");
        return Ok(Vec::new());
    }

    let mut reader = BufReader::new(File::open(path)?);
    let mut scratch = Vec::new();
    let mut documents = Vec::new();

    while let Some(packet) = read_packet(&mut reader, &mut scratch)? {
        documents.push(replay_document(&packet, true)?);
    }

    Ok(documents)
}

/// Convert a recording stream into a replay file.
///
/// Writes the version header document
/// `{playbackfileversion: 1, driveropsfiltered: false}` first, then one
/// document per frame in recording order (without `opType`). Returns the
/// number of packets written on clean EOF.
///
/// # Errors
///
/// Propagates frame decode errors and failures writing to `output`.
pub fn stream_to<R: Read, W: Write>(input: R, output: &mut W) -> Result<u64> {
    let header = doc! { "playbackfileversion": 1_i32, "driveropsfiltered": false };
    header.to_writer(&mut *output).map_err(into_io_error)?;

    let mut reader = BufReader::new(input);
    let mut scratch = Vec::new();
    let mut count = 0;

    while let Some(packet) = read_packet(&mut reader, &mut scratch)? {
        let document = replay_document(&packet, false)?;
        document.to_writer(&mut *output).map_err(into_io_error)?;
        count += 1;
    }

    Ok(count)
}

fn into_io_error(err: bson::ser::Error) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
}
