// tests/scheduler_dispatch.rs

//! Dispatch loop behaviour with a fake executor and an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Timelike, Utc};

use cronrun::engine::{Scheduler, SchedulerConfig, SchedulerHandle};
use cronrun::store::{MemoryStore, TaskStore};
use cronrun::task::TaskStatus;
use cronrun_test_utils::builders::TaskBuilder;
use cronrun_test_utils::fake_executor::FakeExecutor;
use cronrun_test_utils::fake_notifier::RecordingNotifier;
use cronrun_test_utils::init_tracing;

const TICK: Duration = Duration::from_millis(20);

/// A cron expression that is due right now (epoch-based next fire is long
/// past) but, once run, will not fire again for roughly an hour.
fn due_once_cron() -> String {
    format!("{} * * * *", Utc::now().minute())
}

fn start_scheduler(
    store: Arc<MemoryStore>,
    executor: Arc<FakeExecutor>,
) -> (SchedulerHandle, tokio::task::JoinHandle<()>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let config = SchedulerConfig {
        check_interval: TICK,
        max_parallel: 8,
    };
    let scheduler = Scheduler::new(store, executor, notifier, config);
    let handle = scheduler.handle();
    let join = tokio::spawn(async move {
        scheduler.run().await.expect("scheduler run failed");
    });
    (handle, join)
}

/// Let a handful of ticks elapse.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

#[tokio::test]
async fn due_task_runs_once_and_records_bookkeeping() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(&TaskBuilder::new("hello", &due_once_cron(), "echo hello").build())
        .unwrap();

    let executor = Arc::new(FakeExecutor::succeeding());
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    settle().await;
    handle.stop();
    join.await.unwrap();

    assert_eq!(executor.call_count(), 1);

    let task = store.load("hello").unwrap().unwrap();
    assert_eq!(task.run_count, 1);
    assert_eq!(task.fail_count, 0);
    assert_eq!(task.last_status, Some(TaskStatus::Success));
    assert!(task.last_run.is_some());
    assert_eq!(task.runs.len(), 1);
    assert_eq!(task.runs[0].exit_code, Some(0));
}

#[tokio::test]
async fn overlap_guard_blocks_duplicate_dispatch() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(&TaskBuilder::new("slow", &due_once_cron(), "sleep 10").build())
        .unwrap();

    // One invocation spans many ticks.
    let executor = Arc::new(FakeExecutor::succeeding().with_latency(Duration::from_millis(300)));
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    settle().await;
    // Several ticks have elapsed while the first invocation is still
    // running; no duplicate may have been dispatched.
    assert_eq!(executor.call_count(), 1);

    handle.stop();
    join.await.unwrap();

    assert_eq!(executor.call_count(), 1);
    let task = store.load("slow").unwrap().unwrap();
    assert_eq!(task.run_count, 1);
}

#[tokio::test]
async fn on_startup_task_runs_exactly_once() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(&TaskBuilder::new("boot", "@reboot", "echo boot").build())
        .unwrap();

    let executor = Arc::new(FakeExecutor::succeeding());
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    // Many ticks pass; the startup task must not be re-dispatched.
    settle().await;
    settle().await;
    handle.stop();
    join.await.unwrap();

    assert_eq!(executor.call_count(), 1);
    let task = store.load("boot").unwrap().unwrap();
    assert_eq!(task.run_count, 1);
    assert_eq!(task.last_status, Some(TaskStatus::Success));
}

#[tokio::test]
async fn pause_gates_dispatch_and_resume_fires_once() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let executor = Arc::new(FakeExecutor::succeeding());
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    handle.pause();
    store
        .save(&TaskBuilder::new("later", &due_once_cron(), "echo later").build())
        .unwrap();

    settle().await;
    assert_eq!(executor.call_count(), 0, "paused scheduler must not dispatch");
    assert!(handle.status().paused);

    handle.resume();
    settle().await;
    // All slots missed while paused collapse into a single firing.
    assert_eq!(executor.call_count(), 1);

    handle.stop();
    join.await.unwrap();
}

#[tokio::test]
async fn disabled_tasks_are_not_dispatched() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(
            &TaskBuilder::new("off", &due_once_cron(), "echo off")
                .enabled(false)
                .build(),
        )
        .unwrap();

    let executor = Arc::new(FakeExecutor::succeeding());
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    settle().await;
    handle.stop();
    join.await.unwrap();

    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn tasks_added_while_running_are_picked_up_next_tick() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let executor = Arc::new(FakeExecutor::succeeding());
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    settle().await;
    assert_eq!(executor.call_count(), 0);

    // No caching across ticks: an external edit shows up within one tick.
    store
        .save(&TaskBuilder::new("fresh", &due_once_cron(), "echo fresh").build())
        .unwrap();
    settle().await;
    assert_eq!(executor.call_count(), 1);

    handle.stop();
    join.await.unwrap();
}

#[tokio::test]
async fn stop_lets_in_flight_runs_finish() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(&TaskBuilder::new("finishing", &due_once_cron(), "slow").build())
        .unwrap();

    let executor = Arc::new(FakeExecutor::succeeding().with_latency(Duration::from_millis(200)));
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    // Give the loop a moment to dispatch, then request a stop while the
    // invocation is still running.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(executor.call_count(), 1);
    handle.stop();
    join.await.unwrap();

    // run() drains in-flight work, so bookkeeping is complete by now.
    let task = store.load("finishing").unwrap().unwrap();
    assert_eq!(task.run_count, 1);
    assert_eq!(task.last_status, Some(TaskStatus::Success));
}

#[tokio::test]
async fn run_events_are_emitted_per_completed_invocation() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(&TaskBuilder::new("evented", &due_once_cron(), "echo hi").build())
        .unwrap();

    let executor = Arc::new(FakeExecutor::succeeding());
    let notifier = Arc::new(RecordingNotifier::new());
    let (events_tx, mut events_rx) = tokio::sync::mpsc::channel(16);
    let config = SchedulerConfig {
        check_interval: TICK,
        max_parallel: 8,
    };
    let scheduler =
        Scheduler::new(store, executor, notifier, config).with_run_events(events_tx);
    let handle = scheduler.handle();
    let join = tokio::spawn(async move {
        scheduler.run().await.expect("scheduler run failed");
    });

    let event = tokio::time::timeout(Duration::from_secs(3), events_rx.recv())
        .await
        .expect("run event within 3s")
        .expect("event channel open");
    assert_eq!(event.task, "evented");
    assert_eq!(event.run.status, TaskStatus::Success);
    assert!(event.run.finished_at.is_some());

    handle.stop();
    join.await.unwrap();
}

#[tokio::test]
async fn status_reflects_lifecycle_and_run_count() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(&TaskBuilder::new("counted", &due_once_cron(), "echo hi").build())
        .unwrap();

    let executor = Arc::new(FakeExecutor::succeeding());
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    settle().await;
    let status = handle.status();
    assert!(status.running);
    assert!(!status.paused);
    assert!(status.started_at.is_some());
    assert_eq!(status.run_count, 1);
    assert_eq!(status.check_interval, TICK);

    handle.stop();
    join.await.unwrap();
    assert!(!handle.status().running);
}
