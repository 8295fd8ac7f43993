//! Scripted transport for testing.

use super::{SubmitRequest, Transport};
use crate::error::{ErrorKind, Result};
use crate::models::{CompressionJob, JobStatus};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A request received by a [`MockTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportCall {
    Submit(SubmitRequest),
    Status(String),
    Fetch(String),
}

type Scripted = std::result::Result<CompressionJob, ErrorKind>;

/// In-memory [`Transport`] replaying scripted server answers.
///
/// Submissions and status checks each pop the next scripted answer. The last
/// status answer repeats forever, so a single `processing` status is enough to
/// simulate a job that never finishes. Every call is recorded.
///
/// # Examples
///
/// Requires the `mock` feature.
///
/// ```ignore
/// use dossier_service::models::{CompressionJob, JobStatus};
/// use dossier_service::transport::{MockTransport, Transport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = MockTransport::default()
///     .with_statuses([CompressionJob::new("j", JobStatus::Processing).with_progress(40)]);
/// assert_eq!(transport.job_status("j").await.unwrap().progress, 40);
/// assert_eq!(transport.job_status("j").await.unwrap().progress, 40);
/// assert_eq!(transport.status_calls(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockTransport {
    submissions: Mutex<VecDeque<Scripted>>,
    statuses: Mutex<VecDeque<Scripted>>,
    downloads: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<TransportCall>>,
    submit_delay: Option<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Answer the next submission with `job`.
    pub fn with_submit(self, job: CompressionJob) -> Self {
        lock(&self.submissions).push_back(Ok(job));
        self
    }

    /// Fail the next submission.
    pub fn with_submit_error(self, kind: ErrorKind) -> Self {
        lock(&self.submissions).push_back(Err(kind));
        self
    }

    /// Wait this long before answering a submission, to simulate a slow
    /// upload. Uses the tokio clock, so paused-time tests stay instant.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    /// Answer status checks with `jobs`, in order.
    pub fn with_statuses(self, jobs: impl IntoIterator<Item = CompressionJob>) -> Self {
        lock(&self.statuses).extend(jobs.into_iter().map(Ok));
        self
    }

    /// Fail the next status check (after any already scripted).
    pub fn with_status_error(self, kind: ErrorKind) -> Self {
        lock(&self.statuses).push_back(Err(kind));
        self
    }

    /// Serve `data` for downloads of `url`.
    pub fn with_download(self, url: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        lock(&self.downloads).insert(url.into(), data.into());
        self
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        lock(&self.calls).clone()
    }

    pub fn submissions(&self) -> Vec<SubmitRequest> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                TransportCall::Submit(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn status_calls(&self) -> usize {
        lock(&self.calls).iter().filter(|call| matches!(call, TransportCall::Status(_))).count()
    }

    fn record(&self, call: TransportCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, request: SubmitRequest) -> Result<CompressionJob> {
        self.record(TransportCall::Submit(request));
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = lock(&self.submissions).pop_front();
        match scripted {
            Some(Ok(job)) => Ok(job),
            Some(Err(kind)) => Err(kind.into()),
            None => Ok(CompressionJob::new("mock-job", JobStatus::Processing)),
        }
    }

    async fn job_status(&self, job_id: &str) -> Result<CompressionJob> {
        self.record(TransportCall::Status(job_id.to_string()));
        let scripted = {
            let mut statuses = lock(&self.statuses);
            if statuses.len() > 1 { statuses.pop_front() } else { statuses.front().cloned() }
        };
        match scripted {
            Some(Ok(job)) => Ok(job),
            Some(Err(kind)) => Err(kind.into()),
            None => Err(ErrorKind::Server(format!("no status scripted for {job_id}")).into()),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.record(TransportCall::Fetch(url.to_string()));
        let data = lock(&self.downloads).get(url).cloned();
        data.ok_or_else(|| exn::Exn::from(ErrorKind::Server("download failed (HTTP 404)".to_string())))
    }
}
