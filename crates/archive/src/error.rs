//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The archive file does not exist.
    #[display("archive not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The archive exists but could not be opened (permissions, lock).
    #[display("archive locked or unreadable: {}", _0.display())]
    Locked(#[error(not(source))] PathBuf),
    /// Archive is corrupt or malformed. Don't retry with the same input.
    #[display("invalid or corrupted archive")]
    InvalidData,
    /// An entry uses a feature this crate does not handle (encryption,
    /// unknown compression method).
    #[display("unsupported archive entry: {_0}")]
    Unsupported(#[error(not(source))] String),
    /// An entry name would be written outside the extraction root.
    #[display("unsafe entry path: {}", _0.display())]
    UnsafePath(#[error(not(source))] PathBuf),
    /// The requested format is not an archive format.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// Writing extracted content failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io | ErrorKind::Locked(_))
    }
}
