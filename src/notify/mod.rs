// src/notify/mod.rs

//! Notification dispatch.
//!
//! After a run reaches a terminal status the engine decides whether to
//! notify and, if so, hands a [`NotifyRequest`] to the [`Notifier`]. The
//! hand-off is synchronous and its outcome is recorded on the run; actual
//! delivery happens behind the trait (the webhook impl spawns it) and is
//! neither tracked nor retried here.

pub mod webhook;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::Result;
use crate::task::{NotifyConfig, Task, TaskRun, TaskStatus};

pub use webhook::WebhookNotifier;

/// JSON body POSTed to the webhook target.
#[derive(Debug, Clone, Serialize)]
pub struct NotifyPayload {
    pub task: String,
    pub status: TaskStatus,
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stdout: String,
    pub stderr: String,
    pub command: String,
    pub cron: String,
}

/// A payload plus its delivery target.
#[derive(Debug, Clone)]
pub struct NotifyRequest {
    pub url: String,
    pub token: Option<String>,
    pub payload: NotifyPayload,
}

/// Outbound notification hand-off.
///
/// `deliver` must not block on network IO: implementations hand the request
/// off (spawn, enqueue, ...) and return whether the hand-off happened.
pub trait Notifier: Send + Sync {
    fn deliver(&self, request: NotifyRequest) -> Result<()>;
}

/// Notification decision rule.
pub fn should_notify(config: &NotifyConfig, status: TaskStatus) -> bool {
    if !config.enabled {
        return false;
    }
    match status {
        TaskStatus::Success => config.on_success,
        TaskStatus::Failed => config.on_failure,
        _ => false,
    }
}

/// Build the notification request for a finished run, if one is due.
pub fn request_if_due(task: &Task, run: &TaskRun) -> Option<NotifyRequest> {
    if !should_notify(&task.notify, run.status) {
        return None;
    }
    Some(NotifyRequest {
        url: task.notify.url.clone(),
        token: task.notify.token.clone(),
        payload: NotifyPayload {
            task: task.name.clone(),
            status: run.status,
            exit_code: run.exit_code,
            started_at: run.started_at,
            finished_at: run.finished_at,
            stdout: run.stdout.clone(),
            stderr: run.stderr.clone(),
            command: task.command.clone(),
            cron: task.cron.clone(),
        },
    })
}
