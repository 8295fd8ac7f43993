//! Can this input be archived in-process?

use dossier_files::{FileDescriptor, calculate_total_size, format_file_size};

/// Aggregate size above which archives are built by the server instead.
/// Every input is held in memory until the archive is finalized.
pub const LOCAL_SIZE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Answer of [`can_compress_locally`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capability {
    pub can_compress: bool,
    /// Why local compression is not possible; `None` when it is.
    pub reason: Option<String>,
}
impl Capability {
    fn yes() -> Self {
        Self {
            can_compress: true,
            reason: None,
        }
    }

    fn no(reason: impl Into<String>) -> Self {
        Self {
            can_compress: false,
            reason: Some(reason.into()),
        }
    }
}

/// Check whether `files` can be archived in-process using the default
/// [`LOCAL_SIZE_THRESHOLD`].
///
/// Local archives are never encrypted, so any non-empty password rules the
/// local path out regardless of size.
///
/// ```
/// use dossier_archive::can_compress_locally;
/// use dossier_files::LocalFile;
///
/// let files = [LocalFile::in_memory("a.txt", *b"hello")];
/// assert!(can_compress_locally(&files, None).can_compress);
/// assert!(!can_compress_locally(&files, Some("secret")).can_compress);
/// ```
pub fn can_compress_locally<F: FileDescriptor>(files: &[F], password: Option<&str>) -> Capability {
    can_compress_locally_within(files, password, LOCAL_SIZE_THRESHOLD)
}

/// Same as [`can_compress_locally`] with an explicit size threshold.
pub fn can_compress_locally_within<F: FileDescriptor>(
    files: &[F],
    password: Option<&str>,
    threshold: u64,
) -> Capability {
    let total = calculate_total_size(files);
    if total > threshold {
        return Capability::no(format!(
            "files too large for local compression ({} exceeds {})",
            format_file_size(total),
            format_file_size(threshold)
        ));
    }
    if password.is_some_and(|p| !p.is_empty()) {
        return Capability::no("password protection requires server-side compression");
    }
    Capability::yes()
}
