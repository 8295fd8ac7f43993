//! Inputs of a compression request and the pure helpers around them.
//!
//! - [`LocalFile`] / [`RemoteRef`] / [`FileSet`] describe what goes into an
//!   archive; a set is either entirely local or entirely remote.
//! - [`format_file_size`], [`get_file_extension`], [`sanitize_file_name`],
//!   [`calculate_total_size`] and [`check_size_limit`] are side-effect free.

pub mod error;
mod helpers;
mod input;

pub use crate::helpers::{
    MAX_FILE_NAME_LENGTH, SizeCheck, calculate_total_size, check_size_limit, format_file_size, get_file_extension,
    sanitize_file_name,
};
pub use crate::input::{FileDescriptor, FileSet, FileSource, LocalFile, RemoteRef};
