//! Stats snapshot surfaced through server status.

use serde::Serialize;

/// Point-in-time view of the recorder, shaped for the `trafficRecording`
/// server-status section.
///
/// The idle form serializes as just `{"running": false}`; the remaining
/// fields only appear while a recording is active.
#[derive(Debug, Clone, Serialize)]
pub struct RecorderStatus {
    /// Whether a recording is currently active.
    pub running: bool,

    /// Queue capacity in buffered message bytes.
    #[serde(rename = "bufferSize", skip_serializing_if = "Option::is_none")]
    pub buffer_size_limit: Option<u64>,

    /// Message bytes currently waiting in the queue.
    #[serde(rename = "bufferedBytes", skip_serializing_if = "Option::is_none")]
    pub buffered_bytes: Option<u64>,

    /// Bytes accounted against the output file so far.
    #[serde(rename = "currentFileSize", skip_serializing_if = "Option::is_none")]
    pub current_file_size: Option<u64>,

    /// Configured file-size cap.
    #[serde(rename = "maxFileSize", skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,

    /// Path of the output file.
    #[serde(rename = "recordingFile", skip_serializing_if = "Option::is_none")]
    pub recording_file: Option<String>,
}

impl RecorderStatus {
    /// The snapshot reported while no recording is active.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            running: false,
            buffer_size_limit: None,
            buffered_bytes: None,
            current_file_size: None,
            max_file_size: None,
            recording_file: None,
        }
    }
}
