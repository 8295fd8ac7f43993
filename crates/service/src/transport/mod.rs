//! Transport trait and implementations.
//!
//! A [`Transport`] speaks the compression server's REST protocol: submit a
//! job, ask for a job's status, download a finished archive. The service
//! never touches HTTP directly, so tests drive it with a scripted
//! [`MockTransport`] instead of a live server.

mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::http::HttpTransport;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockTransport, TransportCall};
use crate::error::Result;
use crate::models::{CompressionJob, EmailDelivery};
use async_trait::async_trait;
use dossier_archive::ArchiveFormat;
use dossier_files::LocalFile;

/// Client side of the compression server protocol.
///
/// Dropping a returned future aborts the request it represents; that is how
/// the service abandons in-flight requests on cancellation.
///
/// # Examples
///
/// ```
/// use dossier_service::error::Result;
/// use dossier_service::transport::Transport;
///
/// async fn is_finished(transport: &dyn Transport, job_id: &str) -> Result<bool> {
///     Ok(transport.job_status(job_id).await?.status.is_terminal())
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// `POST {api}/compress`: create a job.
    async fn submit(&self, request: SubmitRequest) -> Result<CompressionJob>;

    /// `GET {api}/compress/{id}`: current state of a job.
    async fn job_status(&self, job_id: &str) -> Result<CompressionJob>;

    /// Download the bytes behind `url`, which may be relative to the server.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// One input of a submitted job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitPart {
    /// A local file uploaded as a multipart file field. Transports stream
    /// path-backed files instead of reading them whole.
    File(LocalFile),
    /// A URL the server fetches itself.
    Url(String),
}

/// A job submission, transport independent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitRequest {
    pub parts: Vec<SubmitPart>,
    pub format: ArchiveFormat,
    pub filename: String,
    pub password: Option<String>,
    pub email: Option<EmailDelivery>,
}
impl SubmitRequest {
    /// Multipart field name of the part at `index`: `files[i]` or `urls[i]`.
    pub fn field_name(part: &SubmitPart, index: usize) -> String {
        match part {
            SubmitPart::File(_) => format!("files[{index}]"),
            SubmitPart::Url(_) => format!("urls[{index}]"),
        }
    }

    /// Text fields sent alongside the parts, in submission order.
    ///
    /// ```
    /// use dossier_archive::ArchiveFormat;
    /// use dossier_service::transport::SubmitRequest;
    ///
    /// let request = SubmitRequest {
    ///     parts: Vec::new(),
    ///     format: ArchiveFormat::SevenZip,
    ///     filename: "expediente_42".to_string(),
    ///     password: None,
    ///     email: None,
    /// };
    /// assert_eq!(
    ///     request.text_fields(),
    ///     vec![("format", "7z".to_string()), ("filename", "expediente_42".to_string())]
    /// );
    /// ```
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("format", self.format.as_str().to_string()),
            ("filename", self.filename.clone()),
        ];
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            fields.push(("password", password.to_string()));
        }
        if let Some(email) = &self.email {
            fields.push(("sendEmail", "true".to_string()));
            fields.push(("recipientEmail", email.recipient.clone()));
        }
        fields
    }
}
