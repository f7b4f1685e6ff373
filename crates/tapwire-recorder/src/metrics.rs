//! Recorder metrics registration.

use ::metrics::describe_counter;

/// Initialize recorder metric descriptions (call once at startup).
pub fn init_recorder_metrics() {
    describe_counter!(
        "tapwire_recorder_packets_written_total",
        "Packets appended to the recording file"
    );
    describe_counter!(
        "tapwire_recorder_packets_dropped_total",
        "Packets rejected because the recording buffer was full"
    );
    describe_counter!(
        "tapwire_recorder_bytes_written_total",
        "Frame bytes appended to the recording file"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_recorder_metrics() {
        // Just ensure it doesn't panic
        init_recorder_metrics();
    }
}
