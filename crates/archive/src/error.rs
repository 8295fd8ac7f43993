//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input file could not be read; the whole archive is abandoned.
    #[display("failed to read input file: {_0}")]
    Read(#[error(not(source))] String),
    /// The archive writer rejected an entry or failed to finalize.
    #[display("failed to write archive")]
    Writer,
    /// The cancellation token fired between two files.
    #[display("archive generation cancelled")]
    Cancelled,
    /// The requested format is not supported.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// Saving the finished archive failed.
    #[display("I/O error")]
    Io,
}
