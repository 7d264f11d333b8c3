// tests/retry_behaviour.rs

//! Retry semantics of the execution engine.

use std::sync::Arc;
use std::time::Duration;

use cronrun::engine::{Scheduler, SchedulerConfig, SchedulerHandle};
use cronrun::exec::runner;
use cronrun::store::{MemoryStore, TaskStore};
use cronrun::task::TaskStatus;
use cronrun_test_utils::builders::TaskBuilder;
use cronrun_test_utils::fake_executor::{failure_with_code, FakeExecutor};
use cronrun_test_utils::fake_notifier::RecordingNotifier;
use cronrun_test_utils::init_tracing;

fn start_scheduler(
    store: Arc<MemoryStore>,
    executor: Arc<FakeExecutor>,
) -> (SchedulerHandle, tokio::task::JoinHandle<()>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let config = SchedulerConfig {
        check_interval: Duration::from_millis(20),
        max_parallel: 8,
    };
    let scheduler = Scheduler::new(store, executor, notifier, config);
    let handle = scheduler.handle();
    let join = tokio::spawn(async move {
        scheduler.run().await.expect("scheduler run failed");
    });
    (handle, join)
}

#[tokio::test]
async fn failing_command_is_retried_exactly_max_attempts_times() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(
            &TaskBuilder::new("flaky", "0 0 1 1 *", "false")
                .enabled(false)
                .retry(3, 0)
                .build(),
        )
        .unwrap();

    let executor = Arc::new(FakeExecutor::failing(1));
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    let run = handle.run_task_now("flaky").await.expect("manual run");
    assert_eq!(run.status, TaskStatus::Failed);
    assert_eq!(run.attempt, 3);
    assert_eq!(run.exit_code, Some(1));
    assert_eq!(executor.call_count(), 3);

    // One invocation, one failure, regardless of the attempt count.
    let task = store.load("flaky").unwrap().unwrap();
    assert_eq!(task.run_count, 1);
    assert_eq!(task.fail_count, 1);
    assert_eq!(task.runs.len(), 1);

    handle.stop();
    join.await.unwrap();
}

#[tokio::test]
async fn success_short_circuits_remaining_attempts() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(
            &TaskBuilder::new("second-try", "0 0 1 1 *", "sometimes")
                .enabled(false)
                .retry(5, 0)
                .build(),
        )
        .unwrap();

    // First attempt fails, the default result (success) takes over after.
    let executor = Arc::new(FakeExecutor::succeeding());
    executor.push_result(failure_with_code(1));

    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    let run = handle.run_task_now("second-try").await.expect("manual run");
    assert_eq!(run.status, TaskStatus::Success);
    assert_eq!(run.attempt, 2);
    assert_eq!(executor.call_count(), 2);

    let task = store.load("second-try").unwrap().unwrap();
    assert_eq!(task.run_count, 1);
    assert_eq!(task.fail_count, 0);

    handle.stop();
    join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn retry_delay_separates_attempts() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let executor = Arc::new(FakeExecutor::failing(1));
    let notifier = Arc::new(RecordingNotifier::new());
    let task = TaskBuilder::new("spaced", "0 0 1 1 *", "false")
        .retry(3, 5)
        .build();
    store.save(&task).unwrap();

    let started = tokio::time::Instant::now();
    let run = runner::execute_invocation(task, store.clone(), executor.clone(), notifier, None).await;

    // Three attempts with two 5-second gaps (virtual time).
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(11), "elapsed {elapsed:?}");

    assert_eq!(run.status, TaskStatus::Failed);
    assert_eq!(run.attempt, 3);
    assert_eq!(executor.call_count(), 3);
}

#[tokio::test]
async fn history_stays_bounded_across_invocations() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store
        .save(
            &TaskBuilder::new("bounded", "0 0 1 1 *", "false")
                .enabled(false)
                .max_history(2)
                .build(),
        )
        .unwrap();

    let executor = Arc::new(FakeExecutor::failing(1));
    let (handle, join) = start_scheduler(store.clone(), executor.clone());

    let mut last_id = String::new();
    for _ in 0..5 {
        let run = handle.run_task_now("bounded").await.expect("manual run");
        last_id = run.id;
    }

    let task = store.load("bounded").unwrap().unwrap();
    assert_eq!(task.runs.len(), 2, "history must stay at max_history");
    assert_eq!(task.run_count, 5);
    assert_eq!(task.fail_count, 5);
    // Newest entries are the ones kept.
    assert_eq!(task.runs.last().map(|r| r.id.clone()), Some(last_id));

    handle.stop();
    join.await.unwrap();
}
