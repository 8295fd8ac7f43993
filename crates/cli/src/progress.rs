//! Progress bar fed from a session's observable state.

use dossier_session::SessionState;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}";

pub struct ProgressReporter {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl ProgressReporter {
    /// Draw `updates` until [`finish`](Self::finish) is called.
    pub fn start(mut updates: watch::Receiver<SessionState>) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(TEMPLATE)
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        let task_bar = bar.clone();
        let task = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let state = updates.borrow_and_update().clone();
                task_bar.set_position(u64::from(state.progress));
                task_bar.set_message(describe(&state));
            }
        });
        Self { bar, task }
    }

    pub fn finish(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}

/// One-line summary of a running operation.
pub fn describe(state: &SessionState) -> String {
    let mut parts = Vec::new();
    if let Some(file) = &state.current_file {
        parts.push(file.clone());
    }
    if state.total_size > 0 {
        parts.push(state.total_size_formatted.clone());
    }
    if let Some(seconds) = state.estimated_time_remaining.filter(|s| *s > 0) {
        parts.push(format!("~{seconds}s left"));
    }
    if parts.is_empty() && state.is_compressing {
        parts.push("waiting for the server".to_string());
    }
    parts.join(" · ")
}
