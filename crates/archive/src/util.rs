use crate::ArchiveFormat;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for ArchiveFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for ArchiveFormat {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl ArchiveFormat {
    /// Returns the file extension for this archive format.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::SevenZip => ".7z",
        }
    }

    /// Returns the short name used on the wire and in configuration.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::SevenZip => "7z",
        }
    }

    /// Whether archives of this format can be built in-process.
    #[inline]
    #[must_use]
    pub fn supports_local(&self) -> bool {
        matches!(self, ArchiveFormat::Zip)
    }
}

/// Append the format's extension unless the name already ends with it
/// (case-insensitively).
///
/// ```
/// use dossier_archive::{ArchiveFormat, ensure_extension};
///
/// assert_eq!(ensure_extension("expediente", ArchiveFormat::Zip), "expediente.zip");
/// assert_eq!(ensure_extension("expediente.ZIP", ArchiveFormat::Zip), "expediente.ZIP");
/// assert_eq!(ensure_extension("expediente.zip", ArchiveFormat::SevenZip), "expediente.zip.7z");
/// ```
#[must_use]
pub fn ensure_extension(filename: &str, format: ArchiveFormat) -> String {
    if filename.to_lowercase().ends_with(format.extension()) {
        filename.to_string()
    } else {
        format!("{filename}{}", format.extension())
    }
}
