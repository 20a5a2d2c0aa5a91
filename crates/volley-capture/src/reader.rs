//! Capture reader implementation.

use crate::errors::CaptureError;
use crate::frame::{CaptureHeader, FrameHeader, FrameKind, FRAME_HEADER_SIZE, HEADER_SIZE};
use crate::record::CaptureRecord;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Read mode for handling truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Strict mode: truncated frames are errors.
    Strict,
    /// Permissive mode: truncation is treated as end-of-file.
    Permissive,
}

/// Sequential reader of capture records.
///
/// A recording interrupted mid-write leaves a partial last frame; open such
/// files in [`ReadMode::Permissive`] to replay everything before it.
///
/// # Example
///
/// ```rust,no_run
/// use volley_capture::{CaptureReader, ReadMode};
///
/// let mut reader = CaptureReader::open("run.vlc", ReadMode::Strict)?;
/// while let Some(record) = reader.read_record()? {
///     println!("{} {}", record.at_ms(), record);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct CaptureReader {
    input: BufReader<File>,
    mode: ReadMode,
    position: u64,
}

impl CaptureReader {
    /// Opens a capture file and validates its header.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the file cannot be opened or its header is invalid.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, CaptureError> {
        let mut input = BufReader::new(File::open(path)?);
        let mut header = [0u8; HEADER_SIZE];
        input.read_exact(&mut header).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => CaptureError::InvalidHeader("file too short".to_string()),
            _ => e.into(),
        })?;
        CaptureHeader::from_bytes(&header)?;
        Ok(Self {
            input,
            mode,
            position: HEADER_SIZE as u64,
        })
    }

    /// Byte offset of the next frame.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` at end of file, and on truncation in permissive mode.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, CaptureError> {
        let frame_start = self.position;
        let mut header = [0u8; FRAME_HEADER_SIZE];
        match read_full(&mut self.input, &mut header)? {
            0 => return Ok(None),
            n if n < FRAME_HEADER_SIZE => return self.truncated(frame_start),
            _ => {}
        }
        let frame = FrameHeader::from_bytes(&header, frame_start)?;

        let mut payload = vec![0u8; frame.len as usize];
        if read_full(&mut self.input, &mut payload)? < payload.len() {
            return self.truncated(frame_start);
        }
        self.position += (FRAME_HEADER_SIZE + payload.len()) as u64;
        Ok(Some((frame.kind, payload)))
    }

    fn truncated<T>(&self, offset: u64) -> Result<Option<T>, CaptureError> {
        match self.mode {
            ReadMode::Permissive => {
                debug!(offset, "truncated frame treated as end of capture");
                Ok(None)
            }
            ReadMode::Strict => Err(CaptureError::TruncatedFrame { offset }),
        }
    }

    /// Reads the next record, skipping frames of unknown kinds.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] on framing errors, malformed records, or
    /// truncation in strict mode.
    pub fn read_record(&mut self) -> Result<Option<CaptureRecord>, CaptureError> {
        loop {
            let offset = self.position;
            match self.read_frame()? {
                None => return Ok(None),
                Some((FrameKind::RecordJson, payload)) => {
                    let record = serde_json::from_slice(&payload)
                        .map_err(|source| CaptureError::InvalidRecord { offset, source })?;
                    return Ok(Some(record));
                }
                Some((FrameKind::Unknown(kind), _)) => {
                    debug!(offset, kind, "skipping frame of unknown kind");
                }
            }
        }
    }

    /// Reads every remaining record.
    pub fn read_all(&mut self) -> Result<Vec<CaptureRecord>, CaptureError> {
        let mut records = Vec::new();
        while let Some(record) = self.read_record()? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Fills `buf` as far as the input allows; returns the number of bytes read.
fn read_full(input: &mut impl Read, buf: &mut [u8]) -> Result<usize, CaptureError> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
