//! Cancellation handles of in-flight server jobs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Maps server job ids to the token that aborts their client-side work.
///
/// Entries are added once the server assigns a job id and removed when the
/// job reaches any terminal outcome.
#[derive(Debug, Default)]
pub struct JobTable {
    entries: Mutex<HashMap<String, CancellationToken>>,
}

impl JobTable {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, job_id: &str, token: CancellationToken) {
        self.entries().insert(job_id.to_string(), token);
    }

    pub fn remove(&self, job_id: &str) -> Option<CancellationToken> {
        self.entries().remove(job_id)
    }

    /// Fire and forget the token of `job_id`. Returns `false` for unknown ids.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.remove(job_id) {
            Some(token) => {
                token.cancel();
                true
            },
            None => false,
        }
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.entries().contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
