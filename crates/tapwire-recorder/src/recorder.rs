//! Process-wide traffic recorder.
//!
//! The server's session layer calls [`TrafficRecorder::observe`]
//! synchronously on its own threads for every inbound and outbound message.
//! That call has to be cheap when recording is off, so it is gated by a
//! single relaxed atomic load before any lock is touched.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tapwire_core::config::RecordingConfig;
use tapwire_core::frame::Packet;
use tapwire_core::message::Message;
use tapwire_core::{Error, Result};

use crate::recording::{Recording, RecordingOptions};
use crate::stats::RecorderStatus;

/// Name of the server-status section the recorder reports under.
pub const SERVER_STATUS_SECTION: &str = "trafficRecording";

/// A transport session as seen by the recorder.
pub trait Session {
    /// Stable identifier for the lifetime of the session.
    fn id(&self) -> u64;

    /// "address:port" of the server-side socket.
    fn local(&self) -> String;

    /// "address:port" of the peer socket.
    fn remote(&self) -> String;
}

/// The recorder exposed to the rest of the server.
///
/// Holds at most one non-idle recording at a time. `start` and `stop` swap
/// the recording slot under a short critical section; `observe` only takes
/// that lock after the `should_record` fast path passes.
pub struct TrafficRecorder {
    should_record: AtomicBool,
    directory: String,
    current: Mutex<Option<Arc<Recording>>>,
}

impl std::fmt::Debug for TrafficRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficRecorder")
            .field("should_record", &self.should_record.load(Ordering::Relaxed))
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

static GLOBAL: OnceLock<TrafficRecorder> = OnceLock::new();

impl TrafficRecorder {
    /// Creates a recorder for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `FileNotOpen` if the configured directory does not exist.
    pub fn new(config: &RecordingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            should_record: AtomicBool::new(false),
            directory: config.directory.clone(),
            current: Mutex::new(None),
        })
    }

    /// Install the process-wide recorder.
    ///
    /// # Errors
    ///
    /// Returns `BadValue` if a recorder is already installed, or any error
    /// from [`TrafficRecorder::new`].
    pub fn init(config: &RecordingConfig) -> Result<&'static TrafficRecorder> {
        let recorder = Self::new(config)?;
        GLOBAL
            .set(recorder)
            .map_err(|_| Error::bad_value("traffic recorder already installed"))?;
        Ok(GLOBAL.get().expect("recorder was just installed"))
    }

    /// The process-wide recorder, if one has been installed.
    #[must_use]
    pub fn global() -> Option<&'static TrafficRecorder> {
        GLOBAL.get()
    }

    /// Begin a new recording.
    ///
    /// # Errors
    ///
    /// Returns `BadValue` if the recording directory is unset, the filename
    /// is empty or not a simple filename, or a recording is already active.
    /// I/O errors from launching the writer thread propagate.
    pub fn start(&self, options: RecordingOptions) -> Result<()> {
        if self.directory.is_empty() {
            return Err(Error::bad_value("traffic recording directory not set"));
        }

        let path = self.resolve_path(&options.filename)?;

        {
            let mut current = self.current.lock();
            if current.is_some() {
                return Err(Error::bad_value("traffic recording already active"));
            }

            let recording = Recording::new(&options, path.clone());
            recording.spawn_writer()?;
            *current = Some(recording);
        }

        self.should_record.store(true, Ordering::Relaxed);
        tracing::info!(
            path = %path.display(),
            max_file_size = options.max_file_size,
            buffer_size = options.buffer_size,
            "Traffic recording started"
        );

        Ok(())
    }

    /// End the active recording and surface its terminal result.
    ///
    /// # Errors
    ///
    /// Returns `BadValue` if no recording is active; otherwise whatever
    /// failure terminated the writer (`QueueWouldBlock`, `LogWriteFailed`,
    /// or an I/O error), or `Ok(())` for a clean recording.
    pub fn stop(&self) -> Result<()> {
        self.should_record.store(false, Ordering::Relaxed);

        let recording = self
            .current
            .lock()
            .take()
            .ok_or_else(|| Error::bad_value("traffic recording not active"))?;

        let result = recording.shutdown();
        match &result {
            Ok(()) => tracing::info!("Traffic recording stopped"),
            Err(e) => tracing::warn!(error = %e, "Traffic recording failed"),
        }
        result
    }

    /// Record one observed message.
    ///
    /// Never blocks and never fails: when the recording's buffer is full the
    /// recording is marked failed and further observation is disabled.
    pub fn observe(&self, session: &dyn Session, now: DateTime<Utc>, message: &Message) {
        if !self.should_record.load(Ordering::Relaxed) {
            return;
        }

        let recording = self.current.lock().clone();
        let Some(recording) = recording else {
            return;
        };

        let packet = Packet {
            connection_id: session.id(),
            local: session.local(),
            remote: session.remote(),
            timestamp: now,
            order: recording.next_order(),
            message: message.clone(),
        };

        if recording.push(packet) {
            return;
        }

        // The queue rejected the packet. Disable observation, but only if the
        // recording we pushed to is still the installed one; otherwise it has
        // already been stopped or replaced and must not be disturbed.
        let current = self.current.lock();
        if let Some(installed) = current.as_ref() {
            if Arc::ptr_eq(installed, &recording) {
                self.should_record.store(false, Ordering::Relaxed);
            }
        }
    }

    /// Snapshot for the server-status section.
    #[must_use]
    pub fn stats(&self) -> RecorderStatus {
        if !self.should_record.load(Ordering::Relaxed) {
            return RecorderStatus::idle();
        }

        match self.current.lock().clone() {
            Some(recording) => recording.stats(),
            None => RecorderStatus::idle(),
        }
    }

    /// Resolve `filename` against the recording directory.
    ///
    /// Only simple filenames are accepted: the resolved path's parent must
    /// be the configured directory itself.
    fn resolve_path(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty() {
            return Err(Error::bad_value("traffic recording filename must not be empty"));
        }

        let mut components = Path::new(filename).components();
        let simple = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !simple {
            return Err(Error::bad_value("traffic recording filename must be a simple filename"));
        }

        let directory = self.directory.trim_end_matches('/');
        Ok(Path::new(directory).join(filename))
    }
}
