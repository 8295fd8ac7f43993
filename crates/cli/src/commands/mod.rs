pub mod compress;
pub mod expediente;
pub mod history;
pub mod limits;

use crate::error::{ErrorKind, Result};
use crate::history::{History, HistoryEntry};
use crate::progress::ProgressReporter;
use dossier_config::Config;
use dossier_service::{CompressedArchive, CompressionResult, CompressionService};
use dossier_session::CompressionSession;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Session over an HTTP-backed service for `config`.
fn session(config: &Config) -> Result<Arc<CompressionSession>> {
    let service = CompressionService::with_http(config).map_err(ErrorKind::compression)?;
    Ok(Arc::new(CompressionSession::new(Arc::new(service))))
}

/// Run one compression with a progress bar, cancelling it on Ctrl-C, then
/// make sure the archive is on disk and remember it.
///
/// Ctrl-C stays wired until the follow-up download has finished.
async fn drive(
    config: &Config,
    session: &Arc<CompressionSession>,
    inputs: usize,
    operation: impl Future<Output = CompressionResult>,
) -> Result<CompressedArchive> {
    let reporter = ProgressReporter::start(session.subscribe());
    let interrupted = CancellationToken::new();
    let interrupt = {
        let session = Arc::clone(session);
        let interrupted = interrupted.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling compression");
                session.cancel_compression();
                interrupted.cancel();
            }
        })
    };
    let result = operation.await;
    reporter.finish();
    let saved = persist(session, result, &interrupted).await;
    interrupt.abort();

    let archive = saved?;
    let history = History::new(&config.history_file);
    if let Err(err) = history.record(HistoryEntry::from_archive(&archive, inputs)).await {
        tracing::warn!(error = %*err, "Could not update the compression history");
    }
    Ok(archive)
}

/// Download a server result unless `interrupted` fires first.
async fn persist(
    session: &CompressionSession,
    result: CompressionResult,
    interrupted: &CancellationToken,
) -> Result<CompressedArchive> {
    let archive = result.map_err(ErrorKind::compression)?;
    session.service().save(archive, interrupted).await.map_err(ErrorKind::compression)
}

fn report(archive: &CompressedArchive) {
    match &archive.saved_to {
        Some(path) => println!("Saved {} ({})", path.display(), describe_size(archive)),
        None => println!("{} is ready on the server", archive.filename),
    }
}

fn describe_size(archive: &CompressedArchive) -> String {
    match (archive.job_id.is_some(), archive.size) {
        (false, Some(size)) => dossier_files::format_file_size(size),
        (true, Some(files)) => format!("{files} files"),
        (_, None) => "size unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_service::transport::MockTransport;
    use std::path::Path;

    fn session_with(transport: MockTransport, dir: &Path) -> CompressionSession {
        let mut config = Config::default();
        config.download_dir = dir.to_path_buf();
        CompressionSession::new(Arc::new(CompressionService::new(Arc::new(transport), &config)))
    }

    fn remote_archive() -> CompressedArchive {
        CompressedArchive {
            job_id: Some("job-1".to_string()),
            download_url: Some("/downloads/job-1.zip".to_string()),
            filename: "expediente_42.zip".to_string(),
            size: Some(2),
            saved_to: None,
        }
    }

    #[tokio::test]
    async fn test_persist_downloads_server_result() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with(MockTransport::default().with_download("/downloads/job-1.zip", *b"PK"), dir.path());
        let archive = persist(&session, Ok(remote_archive()), &CancellationToken::new()).await.unwrap();
        assert_eq!(archive.saved_to, Some(dir.path().join("expediente_42.zip")));
        assert_eq!(describe_size(&archive), "2 files");
    }

    #[tokio::test]
    async fn test_interrupt_abandons_download() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_with(MockTransport::default().with_download("/downloads/job-1.zip", *b"PK"), dir.path());
        let interrupted = CancellationToken::new();
        interrupted.cancel();
        let err = persist(&session, Ok(remote_archive()), &interrupted).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(!dir.path().join("expediente_42.zip").exists());
    }
}
