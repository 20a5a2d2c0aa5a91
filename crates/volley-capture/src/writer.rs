//! Capture writer implementation.

use crate::errors::CaptureError;
use crate::frame::{CaptureHeader, FrameHeader, FrameKind, HEADER_SIZE};
use crate::record::CaptureRecord;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// Options for capture writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync after each append (default: false).
    pub sync: bool,
    /// Whether to create the file if it doesn't exist (default: true).
    pub create: bool,
    /// Whether to append to an existing file (default: true); otherwise
    /// existing records are discarded.
    pub append: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
            append: true,
        }
    }
}

/// Append-only writer of capture records.
///
/// # Example
///
/// ```rust,no_run
/// use volley_capture::{CaptureRecord, CaptureWriter, WriteOptions};
///
/// let mut writer = CaptureWriter::open("run.vlc", WriteOptions::default())?;
/// writer.append(&CaptureRecord::FederateResigned { at_ms: 900, federate_name: "SuT".into() })?;
/// writer.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct CaptureWriter {
    file: File,
    sync: bool,
}

impl CaptureWriter {
    /// Opens or creates a capture file.
    ///
    /// An empty file receives a fresh header. A non-empty file must start
    /// with a valid header.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the file cannot be opened or is not a capture.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, CaptureError> {
        let file = OpenOptions::new()
            .create(options.create)
            .write(true)
            .read(true)
            .open(path)?;
        let mut writer = Self {
            file,
            sync: options.sync,
        };

        let len = writer.file.metadata()?.len();
        if len == 0 {
            writer.file.write_all(&CaptureHeader::new().to_bytes())?;
            writer.flush()?;
        } else if len < HEADER_SIZE as u64 {
            return Err(CaptureError::FileNotEmpty);
        } else {
            let mut header = [0u8; HEADER_SIZE];
            writer.file.seek(io::SeekFrom::Start(0))?;
            writer.file.read_exact(&mut header)?;
            CaptureHeader::from_bytes(&header)?;
            if options.append {
                writer.file.seek(io::SeekFrom::End(0))?;
            } else {
                writer.file.set_len(HEADER_SIZE as u64)?;
                writer.file.seek(io::SeekFrom::Start(HEADER_SIZE as u64))?;
            }
        }
        Ok(writer)
    }

    /// Appends one record as a JSON frame.
    pub fn append(&mut self, record: &CaptureRecord) -> Result<(), CaptureError> {
        let payload = serde_json::to_vec(record)?;
        self.append_raw(FrameKind::RecordJson, &payload)
    }

    /// Appends a frame with an arbitrary kind and payload.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), CaptureError> {
        let frame = FrameHeader::new(kind, payload.len())?;
        self.file.write_all(&frame.to_bytes())?;
        self.file.write_all(payload)?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), CaptureError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Flushes and closes the file.
    pub fn finish(mut self) -> Result<(), CaptureError> {
        self.flush()
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.sync {
            let _ = self.file.sync_all();
        }
    }
}
