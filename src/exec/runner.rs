// src/exec/runner.rs

//! One task invocation, driven to completion.
//!
//! [`execute_invocation`] owns the whole lifecycle of a single run: the
//! retry loop, run finalization, the notification hand-off, bookkeeping on
//! the task snapshot, persistence, and the run event. It always produces
//! exactly one finished [`TaskRun`] (timeouts, spawn failures and store
//! errors included), so counters and history never diverge from the actual
//! invocation count.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::RunEvent;
use crate::exec::{CommandExecutor, ExecRequest, ExecutionResult};
use crate::notify::{self, Notifier};
use crate::store::TaskStore;
use crate::task::{NotifyOutcome, Task, TaskRun, TaskStatus};

/// Run the retry loop for one invocation, mutating `run.attempt` as it goes.
///
/// Success (zero exit) short-circuits; a failed attempt with attempts left
/// sleeps `delay_seconds` (suspending only this invocation) and retries.
/// Returns the result of the last attempt made.
pub async fn run_attempts<E>(task: &Task, run: &mut TaskRun, executor: &E) -> ExecutionResult
where
    E: CommandExecutor + ?Sized,
{
    let env = task.decoded_environment();
    let timeout =
        (task.timeout_seconds > 0).then(|| Duration::from_secs(task.timeout_seconds));
    let max_attempts = task.retry.max_attempts.max(1);

    let mut last = ExecutionResult::failure("not executed");
    for attempt in 1..=max_attempts {
        run.attempt = attempt;
        debug!(task = %task.name, run_id = %run.id, attempt, "starting attempt");

        last = executor
            .spawn(ExecRequest {
                command: task.command.clone(),
                working_dir: task.working_dir.clone(),
                env: env.clone(),
                timeout,
            })
            .await;

        if last.success {
            break;
        }

        if attempt < max_attempts {
            warn!(
                task = %task.name,
                run_id = %run.id,
                attempt,
                exit_code = ?last.exit_code,
                "attempt failed; retrying"
            );
            if task.retry.delay_seconds > 0 {
                tokio::time::sleep(Duration::from_secs(task.retry.delay_seconds)).await;
            }
        }
    }

    last
}

/// Execute one invocation of `task` end to end and return the finished run.
pub async fn execute_invocation<S, E, N>(
    mut task: Task,
    store: Arc<S>,
    executor: Arc<E>,
    notifier: Arc<N>,
    events: Option<mpsc::Sender<RunEvent>>,
) -> TaskRun
where
    S: TaskStore + ?Sized,
    E: CommandExecutor + ?Sized,
    N: Notifier + ?Sized,
{
    let mut run = TaskRun::started();
    let result = run_attempts(&task, &mut run, executor.as_ref()).await;

    let status = if result.success {
        TaskStatus::Success
    } else {
        TaskStatus::Failed
    };
    run.finish(status, result.exit_code, &result.stdout, &result.stderr);

    if result.success {
        info!(
            task = %task.name,
            run_id = %run.id,
            attempt = run.attempt,
            "task completed successfully"
        );
    } else {
        error!(
            task = %task.name,
            run_id = %run.id,
            attempt = run.attempt,
            exit_code = ?run.exit_code,
            "task failed"
        );
    }

    // Notification hand-off; only the hand-off outcome lands on the run.
    if let Some(request) = notify::request_if_due(&task, &run) {
        match notifier.deliver(request) {
            Ok(()) => {
                run.notified = Some(NotifyOutcome::Triggered);
                info!(task = %task.name, run_id = %run.id, "notification triggered");
            }
            Err(e) => {
                run.notified = Some(NotifyOutcome::Failed);
                warn!(task = %task.name, run_id = %run.id, error = %e, "notification hand-off failed");
            }
        }
    }

    task.add_run(run.clone());
    if let Err(e) = store.save(&task) {
        warn!(task = %task.name, error = %e, "failed to persist run bookkeeping");
    }

    if let Some(tx) = &events {
        let event = RunEvent {
            task: task.name.clone(),
            run: run.clone(),
        };
        // try_send keeps completions from ever blocking on a slow observer.
        if tx.try_send(event).is_err() {
            debug!(task = %task.name, "run event channel full or closed; event dropped");
        }
    }

    run
}
