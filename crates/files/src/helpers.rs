//! Pure helpers for presenting and validating file inputs.

use crate::FileDescriptor;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const SIZE_BASE: u64 = 1024;
/// Longest file name accepted by common filesystems.
pub const MAX_FILE_NAME_LENGTH: usize = 255;
const UNSAFE_CHARACTERS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Outcome of [`check_size_limit`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizeCheck {
    /// Aggregate size fits the limit.
    pub valid: bool,
    /// Bytes over the limit (zero when valid).
    pub excess: u64,
}

/// Human readable size using base-1024 units with at most two decimals.
///
/// ```
/// use dossier_files::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 B");
/// assert_eq!(format_file_size(1024), "1 KB");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5 GB");
/// ```
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut exponent = 0;
    let mut threshold = SIZE_BASE;
    while exponent < SIZE_UNITS.len() - 1 && bytes >= threshold {
        exponent += 1;
        threshold = threshold.saturating_mul(SIZE_BASE);
    }
    // Precision loss is irrelevant for display purposes.
    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64 / (SIZE_BASE as f64).powi(exponent as i32);
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[exponent])
}

/// Lower-cased text after the last dot; the whole (lower-cased) name when
/// there is no dot at all.
#[must_use]
pub fn get_file_extension(name: &str) -> String {
    name.rsplit_once('.').map_or(name, |(_, extension)| extension).to_lowercase()
}

/// Replace filesystem-unsafe characters and whitespace runs with underscores,
/// then truncate to [`MAX_FILE_NAME_LENGTH`] characters.
///
/// ```
/// use dossier_files::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("a:b*c?.txt"), "a_b_c_.txt");
/// assert_eq!(sanitize_file_name("acta  de\taudiencia.pdf"), "acta_de_audiencia.pdf");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        sanitized.push(if UNSAFE_CHARACTERS.contains(&c) { '_' } else { c });
    }
    match sanitized.char_indices().nth(MAX_FILE_NAME_LENGTH) {
        Some((cut, _)) => sanitized[..cut].to_string(),
        None => sanitized,
    }
}

/// Sum of the sizes of every file descriptor, saturating at `u64::MAX`.
pub fn calculate_total_size<F: FileDescriptor>(files: &[F]) -> u64 {
    files.iter().map(FileDescriptor::size).fold(0, u64::saturating_add)
}

/// Check whether the aggregate size of `files` fits within `max_bytes`.
pub fn check_size_limit<F: FileDescriptor>(files: &[F], max_bytes: u64) -> SizeCheck {
    let total = calculate_total_size(files);
    SizeCheck {
        valid: total <= max_bytes,
        excess: total.saturating_sub(max_bytes),
    }
}
