use thiserror::Error;

/// Errors that can occur while reading, writing or replaying captures.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid file header (magic, version, or flags).
    #[error("invalid capture header: {0}")]
    InvalidHeader(String),
    /// Invalid frame structure (reserved bytes or length).
    #[error("invalid frame at offset {offset}: {reason}")]
    InvalidFrame {
        /// Byte offset where the frame starts.
        offset: u64,
        /// Reason for invalidity.
        reason: String,
    },
    /// Payload exceeds maximum size limit.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// Actual payload size.
        size: usize,
        /// Maximum allowed size.
        max: u32,
    },
    /// Record payload is not a valid JSON record.
    #[error("invalid record at offset {offset}: {source}")]
    InvalidRecord {
        /// Byte offset of the record's frame.
        offset: u64,
        /// Parse failure.
        source: serde_json::Error,
    },
    /// Record could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Attempted to open a file that is too short to hold a header.
    #[error("file is not empty; cannot initialize header")]
    FileNotEmpty,
    /// Truncated frame detected in strict mode.
    #[error("truncated frame at offset {offset}")]
    TruncatedFrame {
        /// Byte offset where truncation occurred.
        offset: u64,
    },
    /// Replay speed must be a positive finite factor.
    #[error("invalid replay speed {0}")]
    InvalidSpeed(f64),
}
