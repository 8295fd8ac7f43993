//! Persistent list of finished compressions.

use crate::error::{ErrorKind, Result};
use dossier_service::CompressedArchive;
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Entries beyond this many are dropped, oldest first.
pub const MAX_ENTRIES: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Saved path, or the download URL when nothing was saved.
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Number of inputs.
    pub files: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
impl HistoryEntry {
    pub fn from_archive(archive: &CompressedArchive, files: usize) -> Self {
        let location = match (&archive.saved_to, &archive.download_url) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(url)) => url.clone(),
            (None, None) => String::new(),
        };
        Self {
            filename: archive.filename.clone(),
            job_id: archive.job_id.clone(),
            location,
            size: archive.saved_to.as_ref().and(archive.size),
            files,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// History stored as a JSON array, oldest entry first.
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, oldest first. A missing file is an empty history.
    pub async fn load(&self) -> Result<Vec<HistoryEntry>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).or_raise(|| ErrorKind::History(self.path.clone())),
        };
        serde_json::from_slice(&data).or_raise(|| ErrorKind::History(self.path.clone()))
    }

    pub async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.load().await?;
        entries.push(entry);
        let excess = entries.len().saturating_sub(MAX_ENTRIES);
        entries.drain(..excess);
        self.store(&entries).await
    }

    /// Up to `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.load().await?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                Err(err).or_raise(|| ErrorKind::History(self.path.clone()))
            },
            _ => Ok(()),
        }
    }

    async fn store(&self, entries: &[HistoryEntry]) -> Result<()> {
        let unusable = || ErrorKind::History(self.path.clone());
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.or_raise(unusable)?;
        }
        let json = serde_json::to_vec_pretty(entries).or_raise(unusable)?;
        tokio::fs::write(&self.path, json).await.or_raise(unusable)?;
        Ok(())
    }
}
