// src/lib.rs

pub mod cli;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod notify;
pub mod schedule;
pub mod store;
pub mod task;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::cli::CliArgs;
use crate::engine::{dueness, Scheduler, SchedulerConfig};
use crate::exec::{runner, ShellExecutor};
use crate::notify::WebhookNotifier;
use crate::store::{FileStore, TaskStore};
use crate::task::TaskStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the file store
/// - the scheduler / executor / notifier
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(FileStore::default_data_dir);
    let store = Arc::new(FileStore::open(&data_dir)?);

    if args.dry_run {
        print_dry_run(store.as_ref())?;
        return Ok(());
    }

    let executor = Arc::new(ShellExecutor::new());
    let notifier = Arc::new(WebhookNotifier::new());

    if let Some(name) = &args.run_now {
        return run_single_task(store, executor, notifier, name).await;
    }

    let config = SchedulerConfig {
        check_interval: Duration::from_secs(args.interval.max(1)),
        max_parallel: args.max_parallel.max(1),
    };
    let scheduler = Scheduler::new(store, executor, notifier, config);
    let handle = scheduler.handle();

    // Ctrl-C → cooperative stop; in-flight runs finish first.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        handle.stop();
    });

    scheduler.run().await?;
    Ok(())
}

/// One manual invocation outside the scheduler loop, for `--run-now`.
async fn run_single_task(
    store: Arc<FileStore>,
    executor: Arc<ShellExecutor>,
    notifier: Arc<WebhookNotifier>,
    name: &str,
) -> Result<()> {
    let task = store
        .load(name)?
        .ok_or_else(|| anyhow::anyhow!("task not found: {name}"))?;

    info!(task = %name, "running task once");
    let run = runner::execute_invocation(task, store, executor, notifier, None).await;

    println!(
        "{}: {} (exit code {}, attempt {})",
        name,
        run.status,
        run.exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into()),
        run.attempt
    );
    if !run.stdout.is_empty() {
        println!("{}", run.stdout);
    }
    if !run.stderr.is_empty() {
        eprintln!("{}", run.stderr);
    }

    if run.status == TaskStatus::Failed {
        anyhow::bail!("task '{name}' failed");
    }
    Ok(())
}

/// Simple dry-run output: print tasks, schedules and next fire times.
fn print_dry_run(store: &FileStore) -> Result<()> {
    let tasks = store.list_all()?;

    println!("cronrun dry-run");
    println!("tasks ({}):", tasks.len());
    for task in &tasks {
        println!("  - {}", task.name);
        println!("      cron: {}", task.cron);
        println!("      cmd: {}", task.command);
        if !task.enabled {
            println!("      enabled: false");
        }
        match dueness::task_next_fire(task) {
            Some(next) => println!("      next_fire: {}", next.to_rfc3339()),
            None => println!("      next_fire: -"),
        }
        if let Some(status) = task.last_status {
            println!(
                "      last: {} ({} runs, {} failed)",
                status, task.run_count, task.fail_count
            );
        }
    }

    Ok(())
}
