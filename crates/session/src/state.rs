use dossier_files::format_file_size;
use dossier_service::CompressedArchive;
use dossier_service::error::ErrorKind;

/// Everything a front end needs to render one compression session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub is_compressing: bool,
    /// Percentage of the running (or last) operation.
    pub progress: u8,
    /// File being added, or the finalizing label; `None` between operations
    /// and for server jobs.
    pub current_file: Option<String>,
    /// Seconds, when the local path can estimate them.
    pub estimated_time_remaining: Option<u64>,
    pub result: Option<CompressedArchive>,
    pub error: Option<ErrorKind>,
    pub total_size: u64,
    pub total_size_formatted: String,
}
impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_compressing: false,
            progress: 0,
            current_file: None,
            estimated_time_remaining: None,
            result: None,
            error: None,
            total_size: 0,
            total_size_formatted: format_file_size(0),
        }
    }
}
impl SessionState {
    /// Fresh state for an operation over `total_size` bytes.
    pub(crate) fn started(total_size: u64) -> Self {
        Self {
            is_compressing: true,
            total_size,
            total_size_formatted: format_file_size(total_size),
            ..Self::default()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(ErrorKind::is_cancelled)
    }
}
