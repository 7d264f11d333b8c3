// src/exec/command.rs

//! Real process execution.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::exec::{CommandExecutor, ExecRequest, ExecutionResult};

/// Production executor: runs commands through the platform shell.
///
/// - stdout/stderr are captured in full; truncation happens when the run
///   record is finalized.
/// - `kill_on_drop` ensures a timed-out child is killed when its
///   `wait_with_output` future is dropped.
/// - Launch failures (e.g. an invalid working directory) become failed
///   results with a synthetic exit code, identical to any other failed
///   attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for ShellExecutor {
    fn spawn(
        &self,
        request: ExecRequest,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ExecutionResult> + Send + '_>> {
        Box::pin(run_command(request))
    }
}

async fn run_command(request: ExecRequest) -> ExecutionResult {
    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&request.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&request.command);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .envs(&request.env)
        .kill_on_drop(true);

    if let Some(dir) = &request.working_dir {
        cmd.current_dir(dir);
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ExecutionResult::failure(format!("failed to spawn command: {e}"));
        }
    };

    let wait = child.wait_with_output();
    let output = match request.timeout {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(result) => result,
            Err(_) => {
                // Dropping the wait future kills the child via kill_on_drop.
                debug!(command = %request.command, "attempt hit its timeout; child killed");
                return ExecutionResult::failure(format!(
                    "command timed out after {} seconds",
                    limit.as_secs()
                ));
            }
        },
        None => wait.await,
    };

    match output {
        Ok(out) => ExecutionResult {
            success: out.status.success(),
            exit_code: Some(out.status.code().unwrap_or(-1)),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        },
        Err(e) => ExecutionResult::failure(format!("failed waiting for command: {e}")),
    }
}
