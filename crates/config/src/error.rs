//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration file extension is not one of toml, yaml, yml, json.
    #[display("unsupported configuration file: {}", _0.display())]
    UnsupportedFile(#[error(not(source))] PathBuf),
    /// An explicitly requested configuration file does not exist.
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The merged configuration could not be deserialized.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// A value deserialized fine but makes no sense.
    #[display("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
