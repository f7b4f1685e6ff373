//! Error types for traffic recording and replay-file decoding.

use thiserror::Error;

/// A specialized `Result` type for tapwire operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while recording traffic or decoding a recording.
#[derive(Debug, Error)]
pub enum Error {
    /// An invalid argument was supplied to a control operation.
    #[error("bad value: {0}")]
    BadValue(String),

    /// The configured recording directory does not exist.
    #[error("traffic recording directory \"{0}\" is not a directory")]
    FileNotOpen(String),

    /// The recording buffer was full when a packet arrived.
    ///
    /// Terminal for the recording; surfaced at the next `stop`.
    #[error("queue would have blocked")]
    QueueWouldBlock,

    /// Writing the next frame would have exceeded the maximum file size.
    ///
    /// Terminal for the recording; surfaced at the next `stop`.
    #[error("hit maximum log size")]
    LogWriteFailed,

    /// A frame declared a length above the 64 MiB ceiling.
    #[error("packet too large: {len} bytes")]
    PacketTooLarge {
        /// The declared frame length.
        len: u32,
    },

    /// The input ended in the middle of a frame.
    #[error("truncated frame")]
    Truncated,

    /// A NUL-terminated string field was missing its terminator or was not
    /// valid UTF-8.
    #[error("malformed string field")]
    MalformedString,

    /// A wire message failed to parse.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new `BadValue` error.
    #[must_use]
    pub fn bad_value(message: impl Into<String>) -> Self {
        Self::BadValue(message.into())
    }

    /// Creates a new `MalformedMessage` error.
    #[must_use]
    pub fn malformed_message(message: impl Into<String>) -> Self {
        Self::MalformedMessage(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::QueueWouldBlock.to_string(), "queue would have blocked");
        assert_eq!(Error::LogWriteFailed.to_string(), "hit maximum log size");
        assert_eq!(
            Error::PacketTooLarge { len: 1 << 27 }.to_string(),
            "packet too large: 134217728 bytes"
        );
        assert_eq!(
            Error::bad_value("traffic recording filename must not be empty").to_string(),
            "bad value: traffic recording filename must not be empty"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from(io);
        assert!(matches!(err, Error::Io(_)));
    }
}
