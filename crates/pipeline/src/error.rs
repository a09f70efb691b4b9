//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only target resolution and lifecycle misuse surface as errors. Per-file
//! verdicts, aborted steps and fatal halts are part of the
//! [`ScanResult`](crate::ScanResult), never an `Err`.

use crate::code::ResponseCode;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// ### Resolution Errors
/// Raised before any step runs; the scan does not start.
/// - [`ErrorKind::ScanPathInvalid`]
/// - [`ErrorKind::FileNotFound`]
/// - [`ErrorKind::Corrupted`]
/// - [`ErrorKind::Locked`]
///
/// ### Operational Errors
/// - [`ErrorKind::Lifecycle`]
/// - [`ErrorKind::TempDir`]
/// - [`ErrorKind::Cleanup`]
/// - [`ErrorKind::UnknownCode`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Target is unset, does not exist or cannot be read.
    #[display("scan path invalid: {}", _0.display())]
    ScanPathInvalid(#[error(not(source))] PathBuf),
    /// Target vanished while it was being resolved.
    #[display("file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
    /// Archive target could not be extracted.
    #[display("corrupted archive: {}", _0.display())]
    Corrupted(#[error(not(source))] PathBuf),
    /// Archive target exists but could not be opened.
    #[display("locked archive: {}", _0.display())]
    Locked(#[error(not(source))] PathBuf),
    /// A step operation was called out of order.
    #[display("step {step} cannot {operation} while {phase}")]
    Lifecycle {
        step: String,
        operation: &'static str,
        phase: &'static str,
    },
    /// Temporary extraction directory could not be created or written.
    #[display("temporary directory unusable: {}", _0.display())]
    TempDir(#[error(not(source))] PathBuf),
    /// Temporary extraction directory could not be removed.
    #[display("failed to remove temporary directory: {}", _0.display())]
    Cleanup(#[error(not(source))] PathBuf),
    /// Numeric value outside the response code space.
    #[display("unknown response code: {_0}")]
    UnknownCode(#[error(not(source))] u16),
}

impl ErrorKind {
    /// The response code reported to the caller for this failure.
    pub fn code(&self) -> ResponseCode {
        match self {
            ErrorKind::ScanPathInvalid(_) => ResponseCode::ScanPathInvalid,
            ErrorKind::FileNotFound(_) => ResponseCode::FileNotFound,
            ErrorKind::Corrupted(_) => ResponseCode::Corrupted,
            ErrorKind::Locked(_) => ResponseCode::Locked,
            ErrorKind::Lifecycle { .. }
            | ErrorKind::TempDir(_)
            | ErrorKind::Cleanup(_)
            | ErrorKind::UnknownCode(_) => ResponseCode::Generic,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Locked(_) | ErrorKind::TempDir(_) | ErrorKind::Cleanup(_))
    }
}
