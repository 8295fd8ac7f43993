//! In-process ZIP generation.

use crate::error::{ErrorKind, Result};
use crate::progress::{CompressionProgress, FINALIZING_LABEL, ProgressFn, percent_of};
use crate::{ArchiveFormat, ensure_extension};
use dossier_files::{LocalFile, calculate_total_size, sanitize_file_name};
use exn::ResultExt;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Deflate level used for every entry. Moderate rather than maximum: the
/// archive is built while the caller waits.
pub const COMPRESSION_LEVEL: i64 = 6;
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// An archive written to disk by [`compress_and_save`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedArchive {
    /// Final file name, always ending in `.zip`.
    pub filename: String,
    pub path: PathBuf,
    /// Archive size in bytes.
    pub size: u64,
}

/// Build a ZIP archive in memory from `files`.
///
/// Files are read one at a time, strictly in input order, and each one is
/// added under its sanitized name before the next is read. After every file a
/// progress snapshot reports `processed / total` bytes; a final snapshot
/// labelled [`FINALIZING_LABEL`] covers writing the central directory.
///
/// `cancel` is checked before every file and before finalizing. A read
/// failure or cancellation abandons the archive: no partial output is
/// returned.
///
/// # Examples
///
/// ```
/// use dossier_archive::{CompressionProgress, generate_zip};
/// use dossier_files::LocalFile;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = vec![LocalFile::in_memory("demanda.txt", *b"En la ciudad de...")];
/// let archive = generate_zip(&files, "expediente.zip", &|_: CompressionProgress| {}, &CancellationToken::new())
///     .await
///     .unwrap();
/// assert!(archive.starts_with(b"PK"));
/// # Ok(())
/// # }
/// ```
#[instrument(skip(files, on_progress, cancel), fields(files = files.len(), total_size, output_size))]
pub async fn generate_zip(
    files: &[LocalFile],
    filename: &str,
    on_progress: ProgressFn<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let total = calculate_total_size(files);
    tracing::Span::current().record("total_size", total);
    let started = Instant::now();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = EntryNames::default();
    let mut processed: u64 = 0;

    for file in files {
        if cancel.is_cancelled() {
            tracing::debug!(processed, total, "Archive generation cancelled");
            exn::bail!(ErrorKind::Cancelled);
        }
        let data = file.read().await.or_raise(|| ErrorKind::Read(file.name().to_string()))?;
        let entry = entries.claim(file.name());
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL))
            .large_file(data.len() as u64 >= ZIP64_THRESHOLD);
        writer.start_file(entry, options).or_raise(|| ErrorKind::Writer)?;
        writer.write_all(&data).or_raise(|| ErrorKind::Writer)?;

        processed = processed.saturating_add(file.size());
        on_progress(CompressionProgress {
            job_id: None,
            percent: percent_of(processed, total),
            processed_bytes: processed,
            total_bytes: total,
            current_file: Some(file.name().to_string()),
            estimated_seconds_remaining: estimate_remaining(started, processed, total),
        });
        // Let the runtime serve other tasks between two files.
        tokio::task::yield_now().await;
    }

    if cancel.is_cancelled() {
        exn::bail!(ErrorKind::Cancelled);
    }
    on_progress(CompressionProgress {
        job_id: None,
        percent: 100,
        processed_bytes: total,
        total_bytes: total,
        current_file: Some(FINALIZING_LABEL.to_string()),
        estimated_seconds_remaining: Some(0),
    });
    let archive = writer.finish().or_raise(|| ErrorKind::Writer)?.into_inner();
    tracing::Span::current().record("output_size", archive.len());
    tracing::debug!(filename, entries = files.len(), "Archive generated");
    Ok(archive)
}

/// Generate an archive with [`generate_zip`] and save it into `directory`.
///
/// The saved name is `filename`, sanitized, with `.zip` appended when it is
/// not already there. The directory is created when missing.
#[instrument(skip(files, on_progress, cancel), fields(directory = %directory.as_ref().display()))]
pub async fn compress_and_save(
    files: &[LocalFile],
    filename: &str,
    directory: impl AsRef<Path>,
    on_progress: ProgressFn<'_>,
    cancel: &CancellationToken,
) -> Result<SavedArchive> {
    let filename = ensure_extension(&sanitize_file_name(filename), ArchiveFormat::Zip);
    let archive = generate_zip(files, &filename, on_progress, cancel).await?;
    let directory = directory.as_ref();
    tokio::fs::create_dir_all(directory).await.or_raise(|| ErrorKind::Io)?;
    let path = directory.join(&filename);
    tokio::fs::write(&path, &archive).await.or_raise(|| ErrorKind::Io)?;
    tracing::info!(path = %path.display(), size = archive.len(), "Saved archive");
    Ok(SavedArchive {
        filename,
        path,
        size: archive.len() as u64,
    })
}

fn estimate_remaining(started: Instant, processed: u64, total: u64) -> Option<u64> {
    if processed == 0 {
        return None;
    }
    let elapsed = started.elapsed().as_secs_f64();
    // Precision loss is irrelevant for an estimate.
    #[allow(clippy::cast_precision_loss)]
    let remaining = elapsed * (total.saturating_sub(processed) as f64) / processed as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let seconds = remaining.ceil() as u64;
    Some(seconds)
}

/// Archive entry names already in use; ZIP entries must be unique.
#[derive(Default)]
struct EntryNames(HashSet<String>);
impl EntryNames {
    /// Sanitize `name` and suffix a counter before the extension until it is
    /// unused: `acta.pdf`, `acta_(1).pdf`, `acta_(2).pdf`...
    fn claim(&mut self, name: &str) -> String {
        let sanitized = sanitize_file_name(name);
        if self.0.insert(sanitized.clone()) {
            return sanitized;
        }
        let (stem, extension) = match sanitized.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => (stem.to_string(), format!(".{extension}")),
            _ => (sanitized.clone(), String::new()),
        };
        let mut counter = 1;
        loop {
            let candidate = format!("{stem}_({counter}){extension}");
            if self.0.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}
