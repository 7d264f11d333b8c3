// src/engine/mod.rs

//! Scheduling engine.
//!
//! This module ties together:
//! - pure due-ness evaluation ([`dueness`])
//! - the tick-driven dispatch loop with its per-task overlap guard
//!   ([`scheduler`])
//!
//! The loop owns all mutable scheduling state (the in-flight arena, the
//! startup-task set); the outside world talks to it through a
//! [`scheduler::SchedulerHandle`].

pub mod dueness;
pub mod scheduler;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::errors::Result;
use crate::task::TaskRun;

pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Control requests flowing from a [`SchedulerHandle`] into the loop.
///
/// Pause/resume/stop are plain flags checked once per tick; only requests
/// that need the loop's own state (the overlap arena) travel the channel.
#[derive(Debug)]
pub enum ControlEvent {
    /// Execute a task immediately, bypassing enabled/due-ness checks but
    /// not the overlap guard. The finished run is sent back on `reply`.
    RunNow {
        name: TaskName,
        reply: oneshot::Sender<Result<TaskRun>>,
    },
}

/// Emitted after every completed invocation, for observers.
#[derive(Debug, Clone)]
pub struct RunEvent {
    pub task: TaskName,
    pub run: TaskRun,
}

/// Snapshot of the scheduler's externally visible state.
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    pub running: bool,
    pub paused: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime_seconds: u64,
    /// Completed invocations since start (scheduled and manual).
    pub run_count: u64,
    pub check_interval: Duration,
}

/// State shared between the loop and its handles.
#[derive(Default)]
pub(crate) struct SharedState {
    running: AtomicBool,
    paused: AtomicBool,
    run_count: AtomicU64,
    started_at: Mutex<Option<DateTime<Utc>>>,
}

impl SharedState {
    pub(crate) fn mark_started(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        *self.started_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::SeqCst);
    }

    pub(crate) fn set_paused(&self, value: bool) {
        self.paused.store(value, Ordering::SeqCst);
    }

    pub(crate) fn note_run_finished(&self) {
        self.run_count.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn status(&self, check_interval: Duration) -> SchedulerStatus {
        let started_at = *self.started_at.lock().unwrap_or_else(|e| e.into_inner());
        let uptime_seconds = started_at
            .map(|t| (Utc::now() - t).num_seconds().max(0) as u64)
            .unwrap_or(0);
        SchedulerStatus {
            running: self.is_running(),
            paused: self.is_paused(),
            started_at,
            uptime_seconds,
            run_count: self.run_count.load(Ordering::SeqCst),
            check_interval,
        }
    }
}
