// Copyright 2026 The Tapwire Authors
// SPDX-License-Identifier: Apache-2.0

//! Offline decoding of tapwire recording files.
//!
//! The reader streams the binary log written by the recorder and rebuilds
//! one BSON document per recorded packet, in the exact shape the external
//! replay tool consumes. Two entry points are provided:
//! - [`recorded_documents`] collects every packet of a file into memory
//! - [`stream_to`] converts a recording into a replay file, document by
//!   document, behind a version header

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod reader;

pub use document::{replay_document, UNIX_TO_INTERNAL_EPOCH_OFFSET};
pub use reader::{recorded_documents, stream_to};
