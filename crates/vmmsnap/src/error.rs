//! Error types for the snapshot crate.

use thiserror::Error;

/// Snapshot parsing/validation errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot file not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("XZ/LZMA decompression error: {0}")]
    Decompression(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("unsupported snapshot format version '{0}' (expected 1.x)")]
    UnsupportedFormat(String),

    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
