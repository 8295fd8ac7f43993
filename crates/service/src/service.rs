use crate::error::{ErrorKind, Result};
use crate::jobs::JobTable;
use crate::models::{CompressOptions, CompressedArchive, CompressionJob, CompressionResult, JobStatus};
use crate::transport::{HttpTransport, SubmitPart, SubmitRequest, Transport};
use dossier_archive::{CompressionProgress, ProgressFn, can_compress_locally_within, compress_and_save, ensure_extension};
use dossier_config::{Config, PollingConfig};
use dossier_files::{FileSet, LocalFile, sanitize_file_name};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Shared handle to a transport.
pub type TransportHandle = Arc<dyn Transport>;

const GENERIC_SERVER_FAILURE: &str = "compression failed on the server";

/// Compresses selections, locally when possible and on the server otherwise.
///
/// Local generation is used for local files whose aggregate size stays under
/// the configured threshold, without a password, in ZIP format. Everything
/// else is submitted to the server and polled until it finishes.
///
/// One service can run several compressions at once; each server job is
/// tracked under its id so [`cancel_compression`](Self::cancel_compression)
/// can reach it.
pub struct CompressionService {
    transport: TransportHandle,
    jobs: JobTable,
    polling: PollingConfig,
    local_threshold: u64,
    download_dir: PathBuf,
}

impl CompressionService {
    pub fn new(transport: TransportHandle, config: &Config) -> Self {
        Self {
            transport,
            jobs: JobTable::default(),
            polling: config.polling.clone(),
            local_threshold: config.local.size_threshold,
            download_dir: config.download_dir.clone(),
        }
    }

    /// Service talking HTTP to the configured server.
    pub fn with_http(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.api)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Number of server jobs currently being watched.
    pub fn active_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Compress a selection, choosing the local or the server path.
    ///
    /// Progress snapshots are delivered in order through `on_progress`.
    /// Cancelling `cancel` ends the operation with [`ErrorKind::Cancelled`].
    #[instrument(skip_all, fields(files = options.files.len(), format = %options.format, path))]
    pub async fn compress_files(
        &self,
        options: CompressOptions,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> CompressionResult {
        if options.files.is_empty() {
            exn::bail!(ErrorKind::Validation("no files selected".to_string()));
        }
        let local = match &options.files {
            FileSet::Local(files) => {
                let capability = can_compress_locally_within(files, options.password(), self.local_threshold);
                if !capability.can_compress {
                    tracing::info!(reason = capability.reason.as_deref(), "Using server-side compression");
                    false
                } else if !options.format.supports_local() {
                    tracing::info!(format = %options.format, "Format requires server-side compression");
                    false
                } else {
                    true
                }
            },
            FileSet::Remote(_) => false,
        };
        if local && let FileSet::Local(files) = &options.files {
            tracing::Span::current().record("path", "local");
            return self.compress_locally(files, &options.filename, on_progress, cancel).await;
        }
        tracing::Span::current().record("path", "server");
        self.compress_on_server(options, on_progress, cancel).await
    }

    async fn compress_locally(
        &self,
        files: &[LocalFile],
        filename: &str,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> CompressionResult {
        let saved = compress_and_save(files, filename, &self.download_dir, on_progress, cancel)
            .await
            .map_err(ErrorKind::archive)?;
        Ok(CompressedArchive {
            job_id: None,
            download_url: None,
            filename: saved.filename,
            size: Some(saved.size),
            saved_to: Some(saved.path),
        })
    }

    /// Submit a selection to the server and wait for the job to finish.
    ///
    /// Cancelling before the server answers abandons the upload. A job that
    /// is already `completed` is returned without polling; a `processing`
    /// job is handed to [`wait_for_completion`](Self::wait_for_completion).
    #[instrument(skip_all, fields(files = options.files.len(), job_id))]
    pub async fn compress_on_server(
        &self,
        options: CompressOptions,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> CompressionResult {
        let fallback_filename = ensure_extension(&options.filename, options.format);
        let submission = async {
            let parts: Vec<SubmitPart> = match &options.files {
                FileSet::Local(files) => files.iter().cloned().map(SubmitPart::File).collect(),
                FileSet::Remote(refs) => refs.iter().map(|r| SubmitPart::Url(r.as_str().to_string())).collect(),
            };
            let request = SubmitRequest {
                parts,
                format: options.format,
                filename: options.filename.clone(),
                password: options.password().map(str::to_string),
                email: options.email.clone(),
            };
            self.transport.submit(request).await
        };
        let job = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!("Compression cancelled before the server assigned a job");
                exn::bail!(ErrorKind::Cancelled);
            },
            job = submission => job?,
        };
        tracing::Span::current().record("job_id", job.id.as_str());
        tracing::debug!(transport = self.transport.name(), status = %job.status, "Server accepted job");

        match job.status {
            JobStatus::Completed => Ok(completed(&job, &fallback_filename)),
            JobStatus::Processing => self.wait_for_completion(&job.id, &fallback_filename, on_progress, cancel).await,
            JobStatus::Error => exn::bail!(ErrorKind::Server(server_failure(&job))),
            other => exn::bail!(ErrorKind::Protocol(other.to_string())),
        }
    }

    /// Poll a server job until it reaches a terminal state.
    ///
    /// Waits the polling interval before every status check, for at most the
    /// configured number of checks. Each non-terminal status produces one
    /// progress snapshot; percentages never go backwards. A failed status
    /// request ends the wait immediately.
    ///
    /// The job is cancellable through
    /// [`cancel_compression`](Self::cancel_compression) for as long as this
    /// runs, and forgotten when it returns.
    #[instrument(skip(self, on_progress, cancel), fields(attempts))]
    pub async fn wait_for_completion(
        &self,
        job_id: &str,
        fallback_filename: &str,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> CompressionResult {
        self.jobs.register(job_id, cancel.clone());
        let result = self.poll(job_id, fallback_filename, on_progress, cancel).await;
        self.jobs.remove(job_id);
        match &result {
            Ok(_) => tracing::info!("Server job completed"),
            Err(err) => tracing::info!(error = %**err, "Server job ended without an archive"),
        }
        result
    }

    async fn poll(
        &self,
        job_id: &str,
        fallback_filename: &str,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> CompressionResult {
        let interval = self.polling.interval();
        let mut percent: u8 = 0;
        for attempt in 1..=self.polling.max_attempts {
            tracing::Span::current().record("attempts", attempt);
            tokio::select! {
                biased;
                () = cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
                () = tokio::time::sleep(interval) => {},
            }
            let job = tokio::select! {
                biased;
                () = cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
                job = self.transport.job_status(job_id) => job?,
            };
            match job.status {
                JobStatus::Completed => return Ok(completed(&job, fallback_filename)),
                JobStatus::Error => exn::bail!(ErrorKind::Server(server_failure(&job))),
                JobStatus::Cancelled => exn::bail!(ErrorKind::Cancelled),
                _ => {
                    percent = percent.max(job.progress.min(100));
                    on_progress(CompressionProgress::for_job(job_id, percent));
                },
            }
        }
        tracing::warn!(attempts = self.polling.max_attempts, "Gave up waiting for server job");
        exn::bail!(ErrorKind::Timeout {
            attempts: self.polling.max_attempts,
        })
    }

    /// Abort the client-side wait for `job_id`.
    ///
    /// Returns `false`, and does nothing else, when the job is not being
    /// watched. The server is not notified.
    pub fn cancel_compression(&self, job_id: &str) -> bool {
        let cancelled = self.jobs.cancel(job_id);
        if cancelled {
            tracing::info!(job_id, "Cancelled server job");
        } else {
            tracing::debug!(job_id, "No active job to cancel");
        }
        cancelled
    }

    /// Download `url` into the download directory under the sanitized
    /// `filename`, returning the saved path.
    ///
    /// Cancelling `cancel` abandons the download; nothing is written.
    #[instrument(skip(self, cancel))]
    pub async fn download_compressed_file(&self, url: &str, filename: &str, cancel: &CancellationToken) -> Result<PathBuf> {
        let name = sanitize_file_name(filename);
        if name.is_empty() {
            exn::bail!(ErrorKind::Validation("download needs a file name".to_string()));
        }
        let data = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!("Download cancelled");
                exn::bail!(ErrorKind::Cancelled);
            },
            data = self.transport.fetch(url) => data?,
        };
        tokio::fs::create_dir_all(&self.download_dir).await.map_err(|e| ErrorKind::Io(e.to_string()))?;
        let path = self.download_dir.join(name);
        tokio::fs::write(&path, &data).await.map_err(|e| ErrorKind::Io(e.to_string()))?;
        tracing::info!(path = %path.display(), size = data.len(), "Downloaded archive");
        Ok(path)
    }

    /// Make sure `archive` exists on this machine, downloading server
    /// results. Local archives are returned unchanged.
    pub async fn save(&self, mut archive: CompressedArchive, cancel: &CancellationToken) -> CompressionResult {
        if let (None, Some(url)) = (&archive.saved_to, &archive.download_url) {
            archive.saved_to = Some(self.download_compressed_file(url, &archive.filename, cancel).await?);
        }
        Ok(archive)
    }
}

fn completed(job: &CompressionJob, fallback_filename: &str) -> CompressedArchive {
    CompressedArchive {
        job_id: Some(job.id.clone()),
        download_url: job.result_url.clone(),
        filename: job.filename.clone().unwrap_or_else(|| fallback_filename.to_string()),
        size: job.files.as_ref().map(|files| files.len() as u64),
        saved_to: None,
    }
}

fn server_failure(job: &CompressionJob) -> String {
    job.error.clone().filter(|e| !e.trim().is_empty()).unwrap_or_else(|| GENERIC_SERVER_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportCall};
    use dossier_archive::{ArchiveFormat, FINALIZING_LABEL};
    use dossier_files::RemoteRef;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        transport: Arc<MockTransport>,
        service: CompressionService,
        _dir: TempDir,
    }

    fn fixture(transport: MockTransport) -> Fixture {
        fixture_with(transport, |_| {})
    }

    fn fixture_with(transport: MockTransport, configure: impl FnOnce(&mut Config)) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.download_dir = dir.path().to_path_buf();
        configure(&mut config);
        let transport = Arc::new(transport);
        let service = CompressionService::new(transport.clone(), &config);
        Fixture {
            transport,
            service,
            _dir: dir,
        }
    }

    fn local_files() -> Vec<LocalFile> {
        vec![
            LocalFile::in_memory("demanda.pdf", vec![1; 64]),
            LocalFile::in_memory("pruebas.pdf", vec![2; 32]),
        ]
    }

    fn remote_refs() -> Vec<RemoteRef> {
        vec![RemoteRef::new("/storage/expedientes/42/a.pdf"), RemoteRef::new("/storage/expedientes/42/b.pdf")]
    }

    fn processing(progress: u8) -> CompressionJob {
        CompressionJob::new("job-1", JobStatus::Processing).with_progress(progress)
    }

    /// Progress snapshots recorded by a test callback.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<CompressionProgress>>);
    impl Recorder {
        fn record(&self, progress: CompressionProgress) {
            self.0.lock().unwrap().push(progress);
        }

        fn snapshots(&self) -> Vec<CompressionProgress> {
            self.0.lock().unwrap().clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_local_set_never_touches_the_server() {
        let f = fixture(MockTransport::default());
        let recorder = Recorder::default();
        let archive = f
            .service
            .compress_files(
                CompressOptions::new(local_files(), "archivos"),
                &|p| recorder.record(p),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(f.transport.calls().is_empty());
        assert_eq!(archive.filename, "archivos.zip");
        assert_eq!(archive.job_id, None);
        let path = archive.saved_to.unwrap();
        assert!(path.starts_with(f.service.download_dir()));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), archive.size.unwrap());

        let snapshots = recorder.snapshots();
        assert!(snapshots.iter().all(|p| p.job_id.is_none()));
        assert!(snapshots.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(snapshots.last().unwrap().current_file.as_deref(), Some(FINALIZING_LABEL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_selection_is_rejected() {
        let f = fixture(MockTransport::default());
        let err = f
            .service
            .compress_files(
                CompressOptions::new(Vec::<LocalFile>::new(), "archivos"),
                &|_| {},
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
        assert!(f.transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_refs_submit_once() {
        let f = fixture(MockTransport::default().with_submit(
            CompressionJob::new("job-1", JobStatus::Completed)
                .with_result_url("/downloads/job-1.zip")
                .with_files(["a.pdf", "b.pdf"]),
        ));
        let archive = f
            .service
            .compress_files(
                CompressOptions::new(remote_refs(), "expediente_42"),
                &|_| panic!("no progress expected"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let submissions = f.transport.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].parts[0], SubmitPart::Url("/storage/expedientes/42/a.pdf".to_string()));
        assert_eq!(f.transport.status_calls(), 0);
        assert_eq!(archive.download_url.as_deref(), Some("/downloads/job-1.zip"));
        assert_eq!(archive.filename, "expediente_42.zip");
        assert_eq!(archive.size, Some(2));
        assert!(archive.is_remote());
        assert_eq!(f.service.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_completed() {
        let f = fixture(MockTransport::default().with_submit(processing(0)).with_statuses([
            processing(30),
            processing(60),
            CompressionJob::new("job-1", JobStatus::Completed)
                .with_result_url("/downloads/job-1.zip")
                .with_filename("servidor.zip"),
        ]));
        let recorder = Recorder::default();
        let started = tokio::time::Instant::now();
        let archive = f
            .service
            .compress_files(
                CompressOptions::new(remote_refs(), "expediente_42"),
                &|p| recorder.record(p),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(6));
        assert!(started.elapsed() < Duration::from_secs(7));
        assert_eq!(f.transport.status_calls(), 3);
        let percents: Vec<u8> = recorder.snapshots().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![30, 60]);
        assert!(recorder.snapshots().iter().all(|p| p.job_id.as_deref() == Some("job-1")));
        assert_eq!(archive.filename, "servidor.zip");
        assert_eq!(archive.job_id.as_deref(), Some("job-1"));
        assert_eq!(f.service.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_never_goes_backwards() {
        let f = fixture(MockTransport::default().with_submit(processing(0)).with_statuses([
            processing(50),
            processing(20),
            CompressionJob::new("job-1", JobStatus::Completed),
        ]));
        let recorder = Recorder::default();
        f.service
            .compress_files(
                CompressOptions::new(remote_refs(), "x"),
                &|p| recorder.record(p),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let percents: Vec<u8> = recorder.snapshots().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![50, 50]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_max_attempts() {
        let f = fixture(MockTransport::default().with_submit(processing(0)).with_statuses([processing(10)]));
        let err = f
            .service
            .compress_files(CompressOptions::new(remote_refs(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Timeout { attempts: 60 });
        assert_eq!(f.transport.status_calls(), 60);
        assert_eq!(f.service.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_budget_is_configurable() {
        let f = fixture_with(
            MockTransport::default().with_submit(processing(0)).with_statuses([processing(10)]),
            |config| {
                config.polling.max_attempts = 3;
                config.polling.interval_ms = 100;
            },
        );
        let started = tokio::time::Instant::now();
        let err = f
            .service
            .compress_files(CompressOptions::new(remote_refs(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Timeout { attempts: 3 });
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_status() {
        let f = fixture(MockTransport::default().with_submit(processing(0)).with_statuses([
            processing(10),
            CompressionJob::new("job-1", JobStatus::Error).with_error("archivo corrupto"),
        ]));
        let err = f
            .service
            .compress_files(CompressOptions::new(remote_refs(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Server("archivo corrupto".to_string()));
        assert_eq!(f.service.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_without_message() {
        let f = fixture(MockTransport::default().with_submit(CompressionJob::new("job-1", JobStatus::Error)));
        let err = f
            .service
            .compress_files(CompressOptions::new(remote_refs(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Server(GENERIC_SERVER_FAILURE.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_cancelled_status() {
        let f = fixture(
            MockTransport::default()
                .with_submit(processing(0))
                .with_statuses([CompressionJob::new("job-1", JobStatus::Cancelled)]),
        );
        let err = f
            .service
            .compress_files(CompressOptions::new(remote_refs(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_submit_status() {
        let f = fixture(MockTransport::default().with_submit(CompressionJob::new("job-1", JobStatus::Pending)));
        let err = f
            .service
            .compress_files(CompressOptions::new(remote_refs(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Protocol("pending".to_string()));
        assert_eq!(f.transport.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure() {
        let f = fixture(MockTransport::default().with_submit_error(ErrorKind::Server("cuota excedida".to_string())));
        let err = f
            .service
            .compress_files(CompressOptions::new(remote_refs(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(*err, ErrorKind::Server("cuota excedida".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failure_ends_polling() {
        let f = fixture(
            MockTransport::default()
                .with_submit(processing(0))
                .with_status_error(ErrorKind::Network("connection reset".to_string())),
        );
        let err = f
            .service
            .compress_files(CompressOptions::new(remote_refs(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Network(_)));
        assert_eq!(f.transport.status_calls(), 1);
        assert_eq!(f.service.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_compression_during_polling() {
        let f = fixture(MockTransport::default().with_submit(processing(0)).with_statuses([processing(10)]));
        let service = &f.service;
        let cancel = CancellationToken::new();
        let err = service
            .compress_files(
                CompressOptions::new(remote_refs(), "x"),
                &|p| {
                    assert!(service.cancel_compression(p.job_id.as_deref().unwrap()));
                },
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(cancel.is_cancelled());
        assert_eq!(f.transport.status_calls(), 1);
        assert_eq!(service.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_upload() {
        let f = fixture(
            MockTransport::default()
                .with_submit_delay(Duration::from_secs(10))
                .with_submit(processing(0)),
        );
        let cancel = CancellationToken::new();
        let (result, ()) = tokio::join!(
            f.service.compress_files(CompressOptions::new(local_files(), "x").with_password("s"), &|_| {}, &cancel),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                cancel.cancel();
            },
        );
        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(f.transport.submissions().len(), 1);
        assert_eq!(f.transport.status_calls(), 0);
        assert_eq!(f.service.active_jobs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_local_generation() {
        let f = fixture(MockTransport::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = f
            .service
            .compress_files(CompressOptions::new(local_files(), "x"), &|_| {}, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(f.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_unknown_job_is_noop() {
        let f = fixture(MockTransport::default());
        assert!(!f.service.cancel_compression("does-not-exist"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_password_forces_server() {
        let f = fixture(MockTransport::default().with_submit(CompressionJob::new("job-1", JobStatus::Completed)));
        f.service
            .compress_files(
                CompressOptions::new(local_files(), "confidencial").with_password("secreto").with_email("a@b.example"),
                &|_| {},
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let request = &f.transport.submissions()[0];
        assert_eq!(request.parts.len(), 2);
        assert_eq!(request.parts[0], SubmitPart::File(LocalFile::in_memory("demanda.pdf", vec![1; 64])));
        assert_eq!(request.password.as_deref(), Some("secreto"));
        assert_eq!(request.email.as_ref().map(|e| e.recipient.as_str()), Some("a@b.example"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seven_zip_goes_to_server() {
        let f = fixture(MockTransport::default().with_submit(CompressionJob::new("job-1", JobStatus::Completed)));
        let archive = f
            .service
            .compress_files(
                CompressOptions::new(local_files(), "archivos").with_format(ArchiveFormat::SevenZip),
                &|_| {},
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(f.transport.submissions()[0].format, ArchiveFormat::SevenZip);
        assert_eq!(archive.filename, "archivos.7z");
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_selection_goes_to_server() {
        let f = fixture_with(
            MockTransport::default().with_submit(CompressionJob::new("job-1", JobStatus::Completed)),
            |config| config.local.size_threshold = 50,
        );
        f.service
            .compress_files(CompressOptions::new(local_files(), "x"), &|_| {}, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(f.transport.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_download_uses_sanitized_name() {
        let f = fixture(MockTransport::default().with_download("/downloads/job-1.zip", *b"PK\x05\x06"));
        let path = f
            .service
            .download_compressed_file("/downloads/job-1.zip", "expediente 42: final.zip", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(path, f.service.download_dir().join("expediente_42__final.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x05\x06");
        assert_eq!(f.transport.calls(), vec![TransportCall::Fetch("/downloads/job-1.zip".to_string())]);
    }

    #[tokio::test]
    async fn test_save_downloads_remote_archives() {
        let f = fixture(MockTransport::default().with_download("/d/a.zip", *b"PK"));
        let archive = CompressedArchive {
            job_id: Some("job-1".to_string()),
            download_url: Some("/d/a.zip".to_string()),
            filename: "a.zip".to_string(),
            size: Some(1),
            saved_to: None,
        };
        let saved = f.service.save(archive, &CancellationToken::new()).await.unwrap();
        assert_eq!(saved.saved_to, Some(f.service.download_dir().join("a.zip")));
        assert!(!saved.is_remote());
    }

    #[tokio::test]
    async fn test_failed_download() {
        let f = fixture(MockTransport::default());
        let err = f
            .service
            .download_compressed_file("/d/missing.zip", "a.zip", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Server(_)));
    }

    #[tokio::test]
    async fn test_cancelled_download_writes_nothing() {
        let f = fixture(MockTransport::default().with_download("/d/a.zip", *b"PK"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = f.service.download_compressed_file("/d/a.zip", "a.zip", &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(!f.service.download_dir().join("a.zip").exists());
        assert!(f.transport.calls().is_empty());
    }
}
