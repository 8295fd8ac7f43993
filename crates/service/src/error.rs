//! Compression Service Error Types
//!
//! Every failure a compression request can end in maps onto one of the
//! [`ErrorKind`] variants below; callers never have to parse message text to
//! tell a cancellation from a timeout.

use derive_more::{Display, Error};
use dossier_archive::error::{Error as ArchiveError, ErrorKind as ArchiveErrorKind};

/// A service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of compression failures.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was rejected before any work started.
    #[display("{_0}")]
    Validation(#[error(not(source))] String),
    /// In-process archive generation failed.
    #[display("archive generation failed: {_0}")]
    Archive(#[error(not(source))] String),
    /// Reading inputs or saving outputs on this machine failed.
    #[display("I/O error: {_0}")]
    Io(#[error(not(source))] String),
    /// The server could not be reached.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The server reported a failure, either as an HTTP error or as a job in
    /// the `error` state.
    #[display("{_0}")]
    Server(#[error(not(source))] String),
    /// The server answered with a job status this client does not expect at
    /// that point of the protocol.
    #[display("unexpected job status: {_0}")]
    Protocol(#[error(not(source))] String),
    /// The job did not finish within the polling budget.
    #[display("compression timed out after {attempts} status checks")]
    Timeout { attempts: u32 },
    #[display("compression cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// Convert an archive error into a service error, keeping the archive
    /// crate's `Exn` frame as a child in the error tree.
    #[track_caller]
    pub fn archive(err: ArchiveError) -> Error {
        let kind = match &*err {
            ArchiveErrorKind::Cancelled => ErrorKind::Cancelled,
            other => ErrorKind::Archive(other.to_string()),
        };
        err.raise(kind)
    }

    /// The user (or the server, on the user's behalf) stopped the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
