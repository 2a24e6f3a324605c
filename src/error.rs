//! Error types for storage operations

use std::io;
use thiserror::Error;

/// Errors surfaced by readers, caches and backends.
///
/// End of data is deliberately *not* an error: positional reads report it as
/// a short byte count, like `std::os::unix::fs::FileExt::read_at` does.
#[derive(Error, Debug)]
pub enum StorageError {
    /// File id is not present in the index
    #[error("file not found")]
    NotFound,

    /// Caller passed something unusable
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Sector reads require an exactly sector-sized buffer
    #[error("wrong buffer size for reading a sector: {0} bytes")]
    WrongBufferSize(usize),

    /// Sector read on a slot whose connection was already cleared
    #[error("connection is closed")]
    ConnectionClosed,

    /// Fragment files handed to a multi reader must share one size
    #[error("fragment {index} has size {size}, expected {expected}")]
    SizeMismatch {
        index: usize,
        size: i64,
        expected: i64,
    },

    /// The sequential connection to the backend failed mid-stream
    #[error("backend read failed: {0}")]
    Backend(#[from] io::Error),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
