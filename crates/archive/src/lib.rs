//! Archive formats and in-process ZIP generation.
//!
//! This crate provides:
//!
//! - **Format handling** through the [`ArchiveFormat`] enum, parsed from
//!   strings ([`FromStr`](std::str::FromStr))
//! - **Local generation** of ZIP archives from [`LocalFile`]s
//!   ([`generate_zip`], [`compress_and_save`]) with byte-level progress and
//!   cooperative cancellation
//! - **Capability checks** deciding whether an input can be archived
//!   in-process at all ([`can_compress_locally`])
//! - **Limits** applied to inputs before anything is submitted
//!   ([`CompressionLimits`])
//!
//! Only ZIP is written locally; 7z archives are always built by the server.
//!
//! [`LocalFile`]: dossier_files::LocalFile

mod capability;
mod construct;
pub mod error;
mod generate;
mod limits;
mod progress;
mod util;

pub use crate::capability::{Capability, LOCAL_SIZE_THRESHOLD, can_compress_locally, can_compress_locally_within};
pub use crate::generate::{COMPRESSION_LEVEL, SavedArchive, compress_and_save, generate_zip};
pub use crate::limits::{CompressionLimits, LimitViolation};
pub use crate::progress::{CompressionProgress, FINALIZING_LABEL, ProgressFn, percent_of};
pub use crate::util::ensure_extension;
use serde::{Deserialize, Serialize};

/// A supported archive format.
///
/// Defaults to [`Zip`](Self::Zip), the only format that can be generated
/// in-process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// ZIP archive (.zip)
    #[default]
    #[serde(rename = "zip")]
    Zip,
    /// 7-Zip archive (.7z), server-side only
    #[serde(rename = "7z")]
    SevenZip,
}
