//! Turns command line paths into a validated selection.

use crate::error::{ErrorKind, Result};
use dossier_archive::{ArchiveFormat, CompressionLimits};
use dossier_files::LocalFile;
use exn::ResultExt;
use std::path::PathBuf;

/// Resolve `paths` into files, expanding directories recursively.
///
/// Files keep the order they were given in; directory contents follow in
/// lexicographic order, depth first. Symbolic links to directories are
/// followed when given explicitly and skipped when found inside a directory.
pub async fn collect_files(paths: &[PathBuf]) -> Result<Vec<LocalFile>> {
    let mut files = Vec::new();
    let mut pending: Vec<(PathBuf, bool)> = paths.iter().rev().map(|path| (path.clone(), true)).collect();
    while let Some((path, explicit)) = pending.pop() {
        let unreadable = || ErrorKind::Input(format!("cannot read {}", path.display()));
        let link = tokio::fs::symlink_metadata(&path).await.or_raise(unreadable)?;
        let linked = link.file_type().is_symlink();
        let metadata = if linked { tokio::fs::metadata(&path).await.or_raise(unreadable)? } else { link };
        if metadata.is_dir() && linked && !explicit {
            tracing::warn!(path = %path.display(), "Skipping linked directory");
            continue;
        }
        if !metadata.is_dir() {
            files.push(LocalFile::from_path(&path).await.or_raise(unreadable)?);
            continue;
        }
        let mut children = Vec::new();
        let mut entries = tokio::fs::read_dir(&path).await.or_raise(unreadable)?;
        while let Some(entry) = entries.next_entry().await.or_raise(unreadable)? {
            children.push(entry.path());
        }
        children.sort();
        tracing::debug!(directory = %path.display(), entries = children.len(), "Expanding directory");
        pending.extend(children.into_iter().rev().map(|child| (child, false)));
    }
    Ok(files)
}

/// Reject selections breaking the configured limits.
pub fn validate(files: &[LocalFile], format: ArchiveFormat, limits: &CompressionLimits) -> Result<()> {
    match limits.violation(files, format) {
        Some(violation) => exn::bail!(ErrorKind::Input(violation.to_string())),
        None => Ok(()),
    }
}
