//! CLI Error Types

use derive_more::{Display, Error};
use dossier_service::error::{Error as ServiceError, ErrorKind as ServiceErrorKind};
use std::path::PathBuf;

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI commands.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration could not be loaded.
    #[display("failed to load configuration")]
    Config,
    /// The selection given on the command line cannot be compressed.
    #[display("{_0}")]
    Input(#[error(not(source))] String),
    #[display("{_0}")]
    Compression(ServiceErrorKind),
    /// The history file could not be read or written.
    #[display("history file unusable: {}", _0.display())]
    History(#[error(not(source))] PathBuf),
}
impl ErrorKind {
    /// Wrap a service error, keeping its frame in the error tree.
    #[track_caller]
    pub fn compression(err: ServiceError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Compression(inner))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Compression(kind) if kind.is_cancelled())
    }
}
