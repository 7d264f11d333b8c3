// src/exec/mod.rs

//! Command execution layer.
//!
//! - [`command`] runs real processes via `tokio::process::Command`.
//! - [`runner`] drives one task invocation to completion: the retry loop,
//!   run finalization, bookkeeping, persistence, and the notification
//!   hand-off.
//!
//! The runtime talks to a [`CommandExecutor`] instead of spawning processes
//! directly, so tests can swap in a fake executor that never forks.

pub mod command;
pub mod runner;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

pub use command::ShellExecutor;

/// Everything needed to run one attempt of a command.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub command: String,
    pub working_dir: Option<PathBuf>,
    /// Extra environment merged over the parent process environment.
    pub env: BTreeMap<String, String>,
    /// Per-attempt wall-clock limit; `None` = unlimited.
    pub timeout: Option<Duration>,
}

/// Outcome of a single command attempt.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// A failed attempt with a synthetic exit code, used for timeouts and
    /// launch failures.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(-1),
            stdout: String::new(),
            stderr: message.into(),
        }
    }
}

/// Trait abstracting how commands are executed.
///
/// Production code uses [`ShellExecutor`]; tests can provide an
/// implementation that scripts results instead of spawning processes.
pub trait CommandExecutor: Send + Sync {
    fn spawn(
        &self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + '_>>;
}
