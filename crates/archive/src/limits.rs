//! Client-side input limits.
//!
//! The server does not enforce these; they only stop obviously oversized
//! requests before anything is read or uploaded.

use crate::ArchiveFormat;
use derive_more::Display;
use dossier_files::{FileDescriptor, calculate_total_size, format_file_size};
use serde::{Deserialize, Serialize};

/// The first limit an input was found to break.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum LimitViolation {
    #[display("no files selected")]
    Empty,
    #[display("too many files: {count} (maximum {max})")]
    TooManyFiles { count: usize, max: usize },
    #[display("{name} is {} (maximum {})", format_file_size(*size), format_file_size(*max))]
    FileTooLarge { name: String, size: u64, max: u64 },
    #[display("selection is {} (maximum {})", format_file_size(*total), format_file_size(*max))]
    TotalTooLarge { total: u64, max: u64 },
    #[display("format not allowed: {_0}")]
    FormatNotAllowed(ArchiveFormat),
}

/// Static limits applied to a selection before compression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionLimits {
    /// Largest single file, in bytes.
    pub max_file_size: u64,
    /// Largest aggregate selection, in bytes.
    pub max_total_size: u64,
    pub max_files: usize,
    pub allowed_formats: Vec<ArchiveFormat>,
}
impl Default for CompressionLimits {
    fn default() -> Self {
        Self {
            max_file_size: 500 * 1024 * 1024,
            max_total_size: 2 * 1024 * 1024 * 1024,
            max_files: 500,
            allowed_formats: vec![ArchiveFormat::Zip, ArchiveFormat::SevenZip],
        }
    }
}
impl CompressionLimits {
    /// Report the first violated limit, checking count, then each file in
    /// order, then the aggregate, then the format.
    ///
    /// ```
    /// use dossier_archive::{ArchiveFormat, CompressionLimits};
    /// use dossier_files::LocalFile;
    ///
    /// let limits = CompressionLimits { max_files: 1, ..CompressionLimits::default() };
    /// let files = [LocalFile::in_memory("a", *b"a"), LocalFile::in_memory("b", *b"b")];
    /// assert_eq!(limits.violation(&files[..1], ArchiveFormat::Zip), None);
    /// assert!(limits.violation(&files, ArchiveFormat::Zip).is_some());
    /// ```
    pub fn violation<F: FileDescriptor>(&self, files: &[F], format: ArchiveFormat) -> Option<LimitViolation> {
        if files.is_empty() {
            return Some(LimitViolation::Empty);
        }
        if files.len() > self.max_files {
            return Some(LimitViolation::TooManyFiles {
                count: files.len(),
                max: self.max_files,
            });
        }
        if let Some(file) = files.iter().find(|f| f.size() > self.max_file_size) {
            return Some(LimitViolation::FileTooLarge {
                name: file.name().to_string(),
                size: file.size(),
                max: self.max_file_size,
            });
        }
        let total = calculate_total_size(files);
        if total > self.max_total_size {
            return Some(LimitViolation::TotalTooLarge {
                total,
                max: self.max_total_size,
            });
        }
        if !self.allowed_formats.contains(&format) {
            return Some(LimitViolation::FormatNotAllowed(format));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_files::LocalFile;

    fn limits() -> CompressionLimits {
        CompressionLimits {
            max_file_size: 10,
            max_total_size: 15,
            max_files: 3,
            allowed_formats: vec![ArchiveFormat::Zip],
        }
    }

    fn file(name: &str, size: usize) -> LocalFile {
        LocalFile::in_memory(name, vec![0; size])
    }

    #[test]
    fn test_within_limits() {
        assert_eq!(limits().violation(&[file("a", 5), file("b", 10)], ArchiveFormat::Zip), None);
    }

    #[test]
    fn test_empty() {
        let files: [LocalFile; 0] = [];
        assert_eq!(limits().violation(&files, ArchiveFormat::Zip), Some(LimitViolation::Empty));
    }

    #[test]
    fn test_too_many_files() {
        let files = [file("a", 1), file("b", 1), file("c", 1), file("d", 1)];
        assert_eq!(
            limits().violation(&files, ArchiveFormat::Zip),
            Some(LimitViolation::TooManyFiles { count: 4, max: 3 })
        );
    }

    #[test]
    fn test_file_too_large_names_first_offender() {
        let files = [file("ok", 1), file("big", 11), file("bigger", 12)];
        let violation = limits().violation(&files, ArchiveFormat::Zip).unwrap();
        assert_eq!(
            violation,
            LimitViolation::FileTooLarge {
                name: "big".to_string(),
                size: 11,
                max: 10
            }
        );
        assert_eq!(violation.to_string(), "big is 11 B (maximum 10 B)");
    }

    #[test]
    fn test_total_too_large() {
        let files = [file("a", 8), file("b", 8)];
        assert_eq!(
            limits().violation(&files, ArchiveFormat::Zip),
            Some(LimitViolation::TotalTooLarge { total: 16, max: 15 })
        );
    }

    #[test]
    fn test_format_not_allowed() {
        let violation = limits().violation(&[file("a", 1)], ArchiveFormat::SevenZip).unwrap();
        assert_eq!(violation, LimitViolation::FormatNotAllowed(ArchiveFormat::SevenZip));
        assert_eq!(violation.to_string(), "format not allowed: 7z");
    }

    #[test]
    fn test_deserialize_partial() {
        let limits: CompressionLimits = serde_json::from_str(r#"{"max_files": 7, "allowed_formats": ["zip"]}"#).unwrap();
        assert_eq!(limits.max_files, 7);
        assert_eq!(limits.allowed_formats, vec![ArchiveFormat::Zip]);
        assert_eq!(limits.max_file_size, CompressionLimits::default().max_file_size);
    }
}
