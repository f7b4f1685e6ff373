// Copyright 2026 The Tapwire Authors
// SPDX-License-Identifier: Apache-2.0

//! Live traffic recording pipeline.
//!
//! This crate provides the recording half of tapwire:
//! - A multi-producer / single-consumer queue bounded by summed item cost
//! - The `Recording` lifecycle entity (one output file, one writer thread)
//! - The process-wide `TrafficRecorder` with its `observe` fast path
//!
//! Session threads hand every inbound and outbound wire message to
//! [`TrafficRecorder::observe`]; a single background thread per recording
//! serializes the packets to an append-only binary log. Failures are
//! terminal for a recording and surface at the next
//! [`TrafficRecorder::stop`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod metrics;
pub mod queue;
pub mod recorder;
pub mod recording;
pub mod stats;

pub use queue::{CostQueue, PopResult};
pub use recorder::{Session, TrafficRecorder, SERVER_STATUS_SECTION};
pub use recording::RecordingOptions;
pub use stats::RecorderStatus;
