//! Compression orchestration.
//!
//! [`CompressionService`] decides where a selection is compressed:
//!
//! - **Locally**, via [`dossier_archive::compress_and_save`], for small
//!   password-less ZIP archives of local files
//! - **On the server**, for everything else: the selection is submitted
//!   through a [`Transport`](transport::Transport) and the resulting job is
//!   polled until it completes, fails, times out, or is cancelled
//!
//! Both paths report the same [`CompressionProgress`](dossier_archive::CompressionProgress)
//! snapshots and end in a [`CompressionResult`](models::CompressionResult).

pub mod error;
mod jobs;
pub mod models;
mod service;
pub mod transport;

pub use crate::jobs::JobTable;
pub use crate::models::{CompressOptions, CompressedArchive, CompressionJob, CompressionResult, EmailDelivery, JobStatus};
pub use crate::service::{CompressionService, TransportHandle};
