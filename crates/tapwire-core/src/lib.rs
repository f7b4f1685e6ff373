// Copyright 2026 The Tapwire Authors
// SPDX-License-Identifier: Apache-2.0

//! Core types for the tapwire traffic recorder.
//!
//! This crate provides the building blocks shared by the recording and
//! decoding halves:
//! - Error types and a crate-wide `Result` alias
//! - Recording configuration
//! - The opaque wire-message type
//! - The on-disk frame codec

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod frame;
pub mod message;

pub use config::RecordingConfig;
pub use error::{Error, Result};
pub use frame::{read_packet, Packet, MAX_FRAME_LEN};
pub use message::{Message, HEADER_LEN, OP_MSG};
