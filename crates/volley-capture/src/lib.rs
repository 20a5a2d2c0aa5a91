//! Append-only capture format and replay federation for Volley.
//!
//! This crate provides:
//! - Framed, append-only storage of recorded federation callbacks
//! - Reader/writer APIs with strict and permissive modes
//! - A replay federation and replayer thread that feed a federate ambassador
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use volley_capture::{CaptureReader, ReadMode, ReplayFederation, Replayer};
//! use volley_core::FederateAmbassador;
//!
//! let records = CaptureReader::open("run.vlc", ReadMode::Permissive)?.read_all()?;
//! let (ambassador, queue) = FederateAmbassador::new();
//! let federation = Arc::new(ReplayFederation::new(ambassador.clone()));
//!
//! let delivered = Replayer::new(records, ambassador, federation)
//!     .with_speed(4.0)?
//!     .spawn()
//!     .join();
//! println!("{:?} records, {} interactions queued", delivered, queue.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Types
//!
//! - [`CaptureWriter`] - Append records to capture files
//! - [`CaptureReader`] - Read records from capture files
//! - [`Replayer`] - Deliver records through ambassador callbacks
//! - [`ReplayFederation`] - Federation membership as seen in the capture
//!
//! ## File Layout
//!
//! A 16-byte header (`VLC1`, version, flags, reserved) followed by frames of
//! an 8-byte header (kind, reserved, little-endian length) and a payload of at
//! most 16 MiB. Kind `0x01` frames hold one JSON [`CaptureRecord`].

#![deny(missing_docs)]

/// Error types for capture operations.
pub mod errors;
/// Frame structure and serialization.
pub mod frame;
/// Capture reader implementation.
pub mod reader;
/// Recorded federation callbacks.
pub mod record;
/// Replay into a federate ambassador.
pub mod replay;
/// Capture writer implementation.
pub mod writer;

pub use errors::CaptureError;
pub use frame::{CaptureHeader, FrameHeader, FrameKind};
pub use reader::{CaptureReader, ReadMode};
pub use record::CaptureRecord;
pub use replay::{ReplayFederation, Replayer};
pub use writer::{CaptureWriter, WriteOptions};
