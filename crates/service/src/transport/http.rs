//! Transport over the compression server's HTTP API.

use super::{SubmitPart, SubmitRequest, Transport};
use crate::error::{ErrorKind, Result};
use crate::models::CompressionJob;
use async_trait::async_trait;
use dossier_config::ApiConfig;
use dossier_files::{FileSource, LocalFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, Url};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::instrument;

/// Error body returned by the server with non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// [`Transport`] backed by [`reqwest`].
///
/// Relative URLs, including a relative API base such as `/api`, are resolved
/// against the configured origin. Files on disk are streamed into the upload,
/// never read whole.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    origin: Url,
    api_base: Url,
}

impl HttpTransport {
    pub fn new(origin: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        let origin = Url::parse(origin).map_err(|e| ErrorKind::Validation(format!("invalid server origin: {e}")))?;
        let api_base = origin.join(api_base).map_err(|e| ErrorKind::Validation(format!("invalid API base: {e}")))?;
        if api_base.cannot_be_a_base() {
            exn::bail!(ErrorKind::Validation(format!("invalid API base: {api_base} has no path")));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ErrorKind::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            origin,
            api_base,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.origin, &config.base, config.timeout())
    }

    /// Absolute URL of the job collection.
    pub fn compress_endpoint(&self) -> Url {
        self.endpoint(["compress"])
    }

    /// Absolute URL of one job. The id is escaped as a single path segment.
    pub fn job_endpoint(&self, job_id: &str) -> Url {
        self.endpoint(["compress", job_id])
    }

    /// Resolve a possibly relative URL against the origin.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        Ok(self.origin.join(url).map_err(|e| ErrorKind::Validation(format!("invalid URL `{url}`: {e}")))?)
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_base.clone();
        // Base URLs were checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn form(request: SubmitRequest) -> Result<Form> {
        let fields = request.text_fields();
        let mut form = Form::new();
        for (index, part) in request.parts.into_iter().enumerate() {
            let field = SubmitRequest::field_name(&part, index);
            form = match part {
                SubmitPart::File(file) => form.part(field, Self::file_part(&file).await?),
                SubmitPart::Url(url) => form.text(field, url),
            };
        }
        for (key, value) in fields {
            form = form.text(key, value);
        }
        Ok(form)
    }

    async fn file_part(file: &LocalFile) -> Result<Part> {
        let part = match file.source() {
            FileSource::Memory(data) => Part::bytes(data.to_vec()),
            FileSource::Path(path) => {
                let unreadable = |e: std::io::Error| ErrorKind::Io(format!("cannot read {}: {e}", path.display()));
                let handle = tokio::fs::File::open(path).await.map_err(unreadable)?;
                let length = handle.metadata().await.map_err(unreadable)?.len();
                tracing::trace!(path = %path.display(), length, "Streaming local file");
                Part::stream_with_length(Body::wrap_stream(ReaderStream::new(handle)), length)
            },
        };
        Ok(part.file_name(file.name().to_string()))
    }

    async fn job_body(response: Response) -> Result<CompressionJob> {
        let body = response.bytes().await.map_err(network)?;
        CompressionJob::from_json(&body)
    }
}

fn network(err: reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Network("request timed out".to_string())
    } else {
        ErrorKind::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(parts = request.parts.len(), format = %request.format))]
    async fn submit(&self, request: SubmitRequest) -> Result<CompressionJob> {
        let form = Self::form(request).await?;
        let response = self.client.post(self.compress_endpoint()).multipart(form).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| format!("compression request failed (HTTP {})", status.as_u16()));
            tracing::warn!(status = status.as_u16(), %message, "Job submission rejected");
            exn::bail!(ErrorKind::Server(message));
        }
        let job = Self::job_body(response).await?;
        tracing::debug!(job_id = %job.id, status = %job.status, "Job submitted");
        Ok(job)
    }

    #[instrument(skip(self))]
    async fn job_status(&self, job_id: &str) -> Result<CompressionJob> {
        let response = self.client.get(self.job_endpoint(job_id)).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Server(format!("job status unavailable (HTTP {})", status.as_u16())));
        }
        Self::job_body(response).await
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.resolve(url)?;
        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Server(format!("download failed (HTTP {})", status.as_u16())));
        }
        Ok(response.bytes().await.map_err(network)?.to_vec())
    }
}
