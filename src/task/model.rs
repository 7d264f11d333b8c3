// src/task/model.rs

//! Task definition and run bookkeeping.
//!
//! A [`Task`] is owned by the persistent store; the scheduler borrows a
//! snapshot per tick and writes back only the bookkeeping fields mutated by
//! [`Task::add_run`]. Field order matters for the TOML files the store
//! writes: scalar fields first, tables (`environment`, `retry`, `notify`)
//! and the `runs` array last.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::run::TaskRun;

/// Lifecycle status of a task or a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Disabled,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// Retry policy for failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Valid range: 1..=10.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds to wait between attempts. 0 = retry immediately.
    #[serde(default)]
    pub delay_seconds: u64,
}

fn default_max_attempts() -> u32 {
    1
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_seconds: 0,
        }
    }
}

/// Webhook notification settings for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub on_success: bool,

    #[serde(default = "default_on_failure")]
    pub on_failure: bool,

    /// Webhook target URL. An empty URL makes the hand-off fail.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Optional bearer token sent as `Authorization: Bearer <token>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_on_failure() -> bool {
    true
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            on_success: false,
            on_failure: default_on_failure(),
            url: String::new(),
            token: None,
        }
    }
}

/// A scheduled task definition plus its run bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique, filesystem-safe task name.
    pub name: String,

    /// Five-field cron expression or a reserved alias (`@daily`, `@reboot`, ...).
    pub cron: String,

    /// Shell command to execute.
    pub command: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Per-attempt timeout in seconds. 0 = unlimited.
    #[serde(default)]
    pub timeout_seconds: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_priority")]
    pub priority: u8,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,

    /// Bound on the `runs` history; oldest entries are evicted first.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<TaskStatus>,

    #[serde(default)]
    pub run_count: u64,

    #[serde(default)]
    pub fail_count: u64,

    /// Environment for the command. Values may be opaque `base64:`-prefixed
    /// secrets, decoded only at execution time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<TaskRun>,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> u8 {
    5
}

fn default_max_history() -> usize {
    50
}

impl Task {
    /// Create a task with default settings.
    pub fn new(name: impl Into<String>, cron: impl Into<String>, command: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            cron: cron.into(),
            command: command.into(),
            enabled: true,
            created_at: now,
            updated_at: now,
            description: String::new(),
            tags: Vec::new(),
            timeout_seconds: 0,
            working_dir: None,
            priority: default_priority(),
            owner: String::new(),
            max_history: default_max_history(),
            last_run: None,
            last_status: None,
            run_count: 0,
            fail_count: 0,
            environment: BTreeMap::new(),
            retry: RetryPolicy::default(),
            notify: NotifyConfig::default(),
            runs: Vec::new(),
        }
    }

    /// Record a completed run.
    ///
    /// Must run exactly once per dispatched invocation, including timeout and
    /// error paths, so counters never diverge from the actual invocation
    /// count. History is bounded by `max_history`, oldest evicted first.
    pub fn add_run(&mut self, run: TaskRun) {
        self.last_run = Some(run.finished_at.unwrap_or(run.started_at));
        self.last_status = Some(run.status);
        self.run_count += 1;
        if run.status == TaskStatus::Failed {
            self.fail_count += 1;
        }

        self.runs.push(run);
        if self.runs.len() > self.max_history {
            let excess = self.runs.len() - self.max_history;
            self.runs.drain(..excess);
        }

        self.updated_at = Utc::now();
    }

    /// Environment with `base64:` values decoded.
    ///
    /// Values that fail to decode are passed through verbatim.
    pub fn decoded_environment(&self) -> BTreeMap<String, String> {
        self.environment
            .iter()
            .map(|(key, value)| {
                let decoded = match value.strip_prefix("base64:") {
                    Some(encoded) => BASE64
                        .decode(encoded)
                        .ok()
                        .and_then(|bytes| String::from_utf8(bytes).ok())
                        .unwrap_or_else(|| value.clone()),
                    None => value.clone(),
                };
                (key.clone(), decoded)
            })
            .collect()
    }

    /// Set an environment variable, optionally base64-encoding the value so
    /// it is opaque in the task file on disk.
    pub fn set_env(&mut self, key: impl Into<String>, value: &str, encode: bool) {
        let stored = if encode {
            format!("base64:{}", BASE64.encode(value.as_bytes()))
        } else {
            value.to_string()
        };
        self.environment.insert(key.into(), stored);
        self.updated_at = Utc::now();
    }
}
