use crate::error::Result;
use derive_more::Display;
use dossier_archive::ArchiveFormat;
use dossier_files::FileSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;

/// Lifecycle state of a server-side job.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[display("pending")]
    Pending,
    #[display("processing")]
    Processing,
    #[display("completed")]
    Completed,
    #[display("error")]
    Error,
    #[display("cancelled")]
    Cancelled,
    /// Any status string this client does not know about.
    #[display("unknown")]
    #[serde(other)]
    Unknown,
}
impl JobStatus {
    /// No further status changes are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }
}

/// A compression job as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionJob {
    pub id: String,
    pub status: JobStatus,
    /// Percentage in `0..=100`. Missing, `null` and non-finite values read
    /// as 0; fractions are rounded and out-of-range values clamped.
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
}
impl CompressionJob {
    /// A bare job in the given state, as the server would first report it.
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            progress: 0,
            result_url: None,
            error: None,
            filename: None,
            files: None,
            expires_at: None,
            created_at: None,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_result_url(mut self, url: impl Into<String>) -> Self {
        self.result_url = Some(url.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_files(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    /// Parse a job from the JSON body of a status response.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| crate::error::ErrorKind::Server(format!("malformed job description: {e}")).into())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_progress<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u8, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()).map_or(0, |v| v.round().clamp(0.0, 100.0) as u8))
}

/// Ask the server to e-mail the finished archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailDelivery {
    pub recipient: String,
}

/// Everything needed to compress one selection.
#[derive(Clone, Debug)]
pub struct CompressOptions {
    pub files: FileSet,
    pub format: ArchiveFormat,
    /// Archive password. An empty password counts as none.
    pub password: Option<String>,
    /// Requested archive name; the extension is added when missing.
    pub filename: String,
    pub email: Option<EmailDelivery>,
}
impl CompressOptions {
    pub fn new(files: impl Into<FileSet>, filename: impl Into<String>) -> Self {
        Self {
            files: files.into(),
            format: ArchiveFormat::default(),
            password: None,
            filename: filename.into(),
            email: None,
        }
    }

    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = (!password.is_empty()).then_some(password);
        self
    }

    pub fn with_email(mut self, recipient: impl Into<String>) -> Self {
        self.email = Some(EmailDelivery {
            recipient: recipient.into(),
        });
        self
    }

    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

/// A finished archive, either saved locally or waiting on the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedArchive {
    /// Server job that produced the archive; `None` for local generation.
    pub job_id: Option<String>,
    /// Where the server offers the archive for download.
    pub download_url: Option<String>,
    pub filename: String,
    /// Archive size in bytes for local archives. For server archives the
    /// protocol only offers the number of input files, which is reported
    /// here instead.
    pub size: Option<u64>,
    /// Local path, once the archive exists on this machine.
    pub saved_to: Option<PathBuf>,
}
impl CompressedArchive {
    pub fn is_remote(&self) -> bool {
        self.saved_to.is_none() && self.download_url.is_some()
    }
}

/// Outcome of a compression request.
pub type CompressionResult = Result<CompressedArchive>;
