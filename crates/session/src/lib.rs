//! Observable compression sessions.
//!
//! A [`CompressionSession`] wraps a shared [`CompressionService`] and keeps a
//! [`SessionState`] that front ends watch through a
//! [`tokio::sync::watch`] channel: whether an operation is running, its
//! progress, and how the last one ended.
//!
//! A session tracks one operation at a time. Starting another replaces the
//! tracked job and cancellation token.

mod state;

pub use crate::state::SessionState;
use dossier_archive::{ArchiveFormat, CompressionProgress};
use dossier_files::{FileSet, LocalFile, RemoteRef};
use dossier_service::error::{ErrorKind, Result};
use dossier_service::{CompressOptions, CompressedArchive, CompressionResult, CompressionService};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::{Date, OffsetDateTime};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// How a selection of local files should be archived.
#[derive(Clone, Debug, Default)]
pub struct CompressSettings {
    pub format: ArchiveFormat,
    pub password: Option<String>,
    /// Archive name; defaults to `archivos_YYYY-MM-DD`.
    pub filename: Option<String>,
    /// Recipient of the finished archive, when it should be e-mailed.
    pub email: Option<String>,
}

#[derive(Default)]
struct Tracked {
    job_id: Option<String>,
    token: Option<CancellationToken>,
}

pub struct CompressionSession {
    service: Arc<CompressionService>,
    state: watch::Sender<SessionState>,
    tracked: Mutex<Tracked>,
}

/// Clears the running flags however the operation ends, including when its
/// future is dropped half way.
struct Finish<'a>(&'a watch::Sender<SessionState>);
impl Drop for Finish<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|state| {
            state.is_compressing = false;
            state.current_file = None;
            state.estimated_time_remaining = None;
        });
    }
}

impl CompressionSession {
    pub fn new(service: Arc<CompressionService>) -> Self {
        Self {
            service,
            state: watch::Sender::new(SessionState::default()),
            tracked: Mutex::new(Tracked::default()),
        }
    }

    pub fn service(&self) -> &CompressionService {
        &self.service
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    fn tracked(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Compress local files.
    ///
    /// An empty selection fails immediately with [`ErrorKind::Validation`]
    /// without reaching the service.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn compress_files(&self, files: Vec<LocalFile>, settings: CompressSettings) -> CompressionResult {
        if files.is_empty() {
            return self.reject("no files selected");
        }
        let filename = settings.filename.filter(|name| !name.trim().is_empty()).unwrap_or_else(default_filename);
        let mut options = CompressOptions::new(files, filename).with_format(settings.format);
        if let Some(password) = settings.password {
            options = options.with_password(password);
        }
        if let Some(recipient) = settings.email {
            options = options.with_email(recipient);
        }
        self.run(options).await
    }

    /// Have the server compress the documents of one case file.
    #[instrument(skip(self, urls), fields(urls = urls.len()))]
    pub async fn compress_expediente(
        &self,
        expediente_id: &str,
        urls: Vec<RemoteRef>,
        filename: Option<String>,
    ) -> CompressionResult {
        if urls.is_empty() {
            return self.reject("the case file has no documents");
        }
        let filename =
            filename.filter(|name| !name.trim().is_empty()).unwrap_or_else(|| format!("expediente_{expediente_id}"));
        self.run(CompressOptions::new(FileSet::Remote(urls), filename)).await
    }

    /// Stop the running operation, if any, and record the cancellation.
    pub fn cancel_compression(&self) {
        let (job_id, token) = {
            let tracked = self.tracked();
            (tracked.job_id.clone(), tracked.token.clone())
        };
        if let Some(job_id) = job_id {
            self.service.cancel_compression(&job_id);
        }
        if let Some(token) = token {
            token.cancel();
        }
        self.state.send_modify(|state| state.error = Some(ErrorKind::Cancelled));
    }

    /// Forget everything, including the tracked job.
    pub fn reset(&self) {
        *self.tracked() = Tracked::default();
        self.state.send_replace(SessionState::default());
    }

    fn reject(&self, message: &str) -> CompressionResult {
        let kind = ErrorKind::Validation(message.to_string());
        self.state.send_modify(|state| {
            state.result = None;
            state.error = Some(kind.clone());
        });
        exn::bail!(kind)
    }

    async fn run(&self, options: CompressOptions) -> CompressionResult {
        let token = CancellationToken::new();
        *self.tracked() = Tracked {
            job_id: None,
            token: Some(token.clone()),
        };
        self.state.send_replace(SessionState::started(options.files.total_size()));
        let finish = Finish(&self.state);

        let on_progress = |progress: CompressionProgress| {
            if let Some(job_id) = &progress.job_id {
                self.track_job(job_id);
            }
            self.state.send_modify(|state| {
                state.progress = progress.percent;
                state.current_file = progress.current_file;
                state.estimated_time_remaining = progress.estimated_seconds_remaining;
            });
        };
        let result = self.service.compress_files(options, &on_progress, &token).await;
        self.record(&result);
        drop(finish);
        result
    }

    fn track_job(&self, job_id: &str) {
        let mut tracked = self.tracked();
        if tracked.job_id.as_deref() != Some(job_id) {
            tracing::debug!(job_id, "Tracking server job");
            tracked.job_id = Some(job_id.to_string());
        }
    }

    fn record(&self, result: &Result<CompressedArchive>) {
        self.state.send_modify(|state| match result {
            Ok(archive) => {
                state.progress = 100;
                state.result = Some(archive.clone());
                state.error = None;
            },
            Err(err) => {
                state.result = None;
                state.error = Some((**err).clone());
            },
        });
    }
}

/// `archivos_YYYY-MM-DD` for today's (UTC) date.
fn default_filename() -> String {
    filename_for(OffsetDateTime::now_utc().date())
}

fn filename_for(date: Date) -> String {
    format!("archivos_{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}
