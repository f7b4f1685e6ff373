//! A single live recording: one output file, one writer thread, one queue.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

// The `metrics` crate shares its name with this crate's `metrics` module, so
// the import needs the leading-colon form.
use ::metrics::counter;
use bytes::BytesMut;
use parking_lot::Mutex;
use tapwire_core::frame::Packet;
use tapwire_core::{Error, Result};

use crate::queue::{CostQueue, PopResult};
use crate::stats::RecorderStatus;

/// Upper bound on the summed message cost drained per writer wakeup.
const WRITE_BATCH_BUDGET: usize = 1 << 24;

/// Options accepted by `start`.
#[derive(Debug, Clone)]
pub struct RecordingOptions {
    /// Simple filename created inside the recording directory.
    pub filename: String,
    /// The recording fails once the file would reach this many bytes.
    pub max_file_size: u64,
    /// Queue capacity, in buffered message bytes.
    pub buffer_size: usize,
}

type PacketQueue = CostQueue<Packet, fn(&Packet) -> usize>;

fn message_cost(packet: &Packet) -> usize {
    packet.message.len()
}

/// One recording: an output file, a bounded packet queue, a background
/// writer thread, and the terminal status the writer leaves behind.
///
/// Failure is terminal. A `Recording` that has failed never resumes; the
/// stored result surfaces when [`Recording::shutdown`] runs.
pub(crate) struct Recording {
    path: PathBuf,
    max_file_size: u64,
    buffer_size: usize,
    queue: Arc<PacketQueue>,
    order: AtomicU64,
    state: Mutex<RecordingState>,
}

struct RecordingState {
    in_shutdown: bool,
    written: u64,
    result: Result<()>,
    thread: Option<JoinHandle<()>>,
}

impl Recording {
    pub(crate) fn new(options: &RecordingOptions, path: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            path,
            max_file_size: options.max_file_size,
            buffer_size: options.buffer_size,
            queue: Arc::new(CostQueue::new(options.buffer_size, message_cost)),
            order: AtomicU64::new(0),
            state: Mutex::new(RecordingState {
                in_shutdown: false,
                written: 0,
                result: Ok(()),
                thread: None,
            }),
        })
    }

    /// Launch the background writer thread.
    pub(crate) fn spawn_writer(self: &Arc<Self>) -> Result<()> {
        let recording = Arc::clone(self);
        let thread = std::thread::Builder::new()
            .name("traffic-recorder".to_string())
            .spawn(move || {
                let result = recording.write_frames();
                let mut state = recording.state.lock();
                if state.result.is_ok() {
                    state.result = result;
                }
            })?;

        self.state.lock().thread = Some(thread);
        Ok(())
    }

    /// Assigns the next order value; orders are dense starting at 1.
    pub(crate) fn next_order(&self) -> u64 {
        self.order.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Offer a packet to the queue.
    ///
    /// Returns false if the queue was full. That is ultimately fatal to the
    /// recording: the producer side closes and `QueueWouldBlock` becomes the
    /// terminal result unless an earlier failure got there first.
    pub(crate) fn push(&self, packet: Packet) -> bool {
        if self.queue.try_push(packet) {
            return true;
        }

        counter!("tapwire_recorder_packets_dropped_total").increment(1);
        self.queue.close();

        let mut state = self.state.lock();
        if state.result.is_ok() {
            state.result = Err(Error::QueueWouldBlock);
        }

        false
    }

    /// Close the queue, join the writer, and return the terminal result.
    ///
    /// Idempotent: only the first call closes and joins; later calls return
    /// `Ok(())`.
    pub(crate) fn shutdown(&self) -> Result<()> {
        let thread = {
            let mut state = self.state.lock();
            if state.in_shutdown {
                return Ok(());
            }
            state.in_shutdown = true;
            state.thread.take()
        };

        self.queue.close();

        if let Some(thread) = thread {
            if thread.join().is_err() {
                let mut state = self.state.lock();
                if state.result.is_ok() {
                    state.result = Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "recording writer thread panicked",
                    )));
                }
            }
        }

        std::mem::replace(&mut self.state.lock().result, Ok(()))
    }

    pub(crate) fn stats(&self) -> RecorderStatus {
        let state = self.state.lock();
        RecorderStatus {
            running: true,
            buffer_size_limit: Some(self.buffer_size as u64),
            buffered_bytes: Some(self.queue.buffered_cost() as u64),
            current_file_size: Some(state.written),
            max_file_size: Some(self.max_file_size),
            recording_file: Some(self.path.display().to_string()),
        }
    }

    /// The writer loop: drain batches, frame each packet, append to disk.
    ///
    /// The size cap is asserted before a frame is emitted, so the file only
    /// ever holds whole frames whose cumulative size stayed under the cap.
    fn write_frames(&self) -> Result<()> {
        let file = File::create(&self.path)?;
        let mut out = BufWriter::new(file);

        let mut frame = BytesMut::new();
        let mut batch: Vec<Packet> = Vec::new();

        loop {
            batch.clear();
            if self.queue.pop_many_up_to(WRITE_BATCH_BUDGET, &mut batch) == PopResult::Consumed {
                out.flush()?;
                return Ok(());
            }

            for packet in &batch {
                frame.clear();
                packet.encode_into(&mut frame);
                let size = frame.len() as u64;

                {
                    let mut state = self.state.lock();
                    state.written += size;
                    if state.written >= self.max_file_size {
                        return Err(Error::LogWriteFailed);
                    }
                }

                out.write_all(&frame)?;
                counter!("tapwire_recorder_packets_written_total").increment(1);
                counter!("tapwire_recorder_bytes_written_total").increment(size);
            }
        }
    }
}
