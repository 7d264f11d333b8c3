// src/task/run.rs

//! Run records: one [`TaskRun`] per dispatched invocation, spanning all of
//! its retry attempts. A run is immutable once `finished_at` is set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::model::TaskStatus;

/// Captured stdout/stderr is truncated to this many characters.
pub const MAX_OUTPUT_CHARS: usize = 10_000;

/// Whether the notification hand-off for a finished run was triggered.
///
/// This records only the hand-off to the notifier, never the delivery
/// outcome; that belongs to the notifier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyOutcome {
    Triggered,
    Failed,
}

/// One recorded invocation of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRun {
    pub id: String,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    #[serde(default = "default_attempt")]
    pub attempt: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified: Option<NotifyOutcome>,
}

fn default_attempt() -> u32 {
    1
}

impl TaskRun {
    /// A fresh run in the `running` state, attempt 1.
    pub fn started() -> Self {
        Self {
            id: short_id(),
            started_at: Utc::now(),
            finished_at: None,
            status: TaskStatus::Running,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: None,
            attempt: 1,
            notified: None,
        }
    }

    /// Move the run to a terminal status, truncating captured output and
    /// stamping `finished_at`/`duration_ms`.
    pub fn finish(&mut self, status: TaskStatus, exit_code: Option<i32>, stdout: &str, stderr: &str) {
        let finished = Utc::now();
        self.status = status;
        self.exit_code = exit_code;
        self.stdout = truncate_output(stdout);
        self.stderr = truncate_output(stderr);
        self.duration_ms = Some((finished - self.started_at).num_milliseconds().max(0) as u64);
        self.finished_at = Some(finished);
    }
}

/// Truncate to [`MAX_OUTPUT_CHARS`] characters with an explicit marker.
fn truncate_output(text: &str) -> String {
    let total = text.chars().count();
    if total <= MAX_OUTPUT_CHARS {
        return text.to_string();
    }
    let kept: String = text.chars().take(MAX_OUTPUT_CHARS).collect();
    format!("{}\n... ({} chars truncated)", kept, total - MAX_OUTPUT_CHARS)
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
