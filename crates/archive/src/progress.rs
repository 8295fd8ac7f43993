//! Progress snapshots shared by the local and server compression paths.

/// Label reported while the archive is being finalized; that phase has no
/// per-file progress of its own.
pub const FINALIZING_LABEL: &str = "Finalizing";

/// Callback receiving progress snapshots, in order.
pub type ProgressFn<'a> = &'a (dyn Fn(CompressionProgress) + Send + Sync);

/// A point-in-time snapshot of one compression operation.
///
/// Both compression paths emit the same shape. The server protocol only
/// reports a percentage, so server-side snapshots leave the byte counters at
/// zero and carry no current file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompressionProgress {
    /// Server job id; `None` for in-process generation.
    pub job_id: Option<String>,
    /// Percentage complete, `0..=100`.
    pub percent: u8,
    pub processed_bytes: u64,
    pub total_bytes: u64,
    pub current_file: Option<String>,
    pub estimated_seconds_remaining: Option<u64>,
}
impl CompressionProgress {
    /// Snapshot for a server-tracked job.
    pub fn for_job(job_id: impl Into<String>, percent: u8) -> Self {
        Self {
            job_id: Some(job_id.into()),
            percent: percent.min(100),
            ..Self::default()
        }
    }
}

/// Integer percentage of `processed` over `total`, clamped to 100. An empty
/// total counts as complete.
#[must_use]
pub fn percent_of(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = u128::from(processed) * 100 / u128::from(total);
    u8::try_from(percent.min(100)).unwrap_or(100)
}
