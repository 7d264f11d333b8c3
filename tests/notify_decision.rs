// tests/notify_decision.rs

//! Notification hand-off after completed runs.

use std::sync::Arc;

use cronrun::exec::runner;
use cronrun::store::{MemoryStore, TaskStore};
use cronrun::task::{NotifyOutcome, Task, TaskStatus};
use cronrun_test_utils::builders::TaskBuilder;
use cronrun_test_utils::fake_executor::FakeExecutor;
use cronrun_test_utils::fake_notifier::{FailingNotifier, RecordingNotifier};
use cronrun_test_utils::init_tracing;

async fn invoke(
    task: Task,
    executor: Arc<FakeExecutor>,
    notifier: Arc<RecordingNotifier>,
) -> (cronrun::task::TaskRun, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.save(&task).unwrap();
    let run = runner::execute_invocation(task, store.clone(), executor, notifier, None).await;
    (run, store)
}

#[tokio::test]
async fn disabled_notifications_are_never_handed_off() {
    init_tracing();

    let task = TaskBuilder::new("quiet", "@daily", "false").build();
    let notifier = Arc::new(RecordingNotifier::new());
    let (run, _) = invoke(task, Arc::new(FakeExecutor::failing(1)), notifier.clone()).await;

    assert_eq!(run.status, TaskStatus::Failed);
    assert_eq!(run.notified, None);
    assert_eq!(notifier.delivery_count(), 0);
}

#[tokio::test]
async fn failure_notifies_when_on_failure_is_set() {
    init_tracing();

    let task = TaskBuilder::new("report", "@daily", "make report")
        .notify_on(false, true)
        .build();
    let notifier = Arc::new(RecordingNotifier::new());
    let (run, store) = invoke(task, Arc::new(FakeExecutor::failing(2)), notifier.clone()).await;

    assert_eq!(run.notified, Some(NotifyOutcome::Triggered));
    assert_eq!(notifier.delivery_count(), 1);

    let request = &notifier.deliveries()[0];
    assert_eq!(request.payload.task, "report");
    assert_eq!(request.payload.status, TaskStatus::Failed);
    assert_eq!(request.payload.exit_code, Some(2));
    assert_eq!(request.payload.command, "make report");
    assert_eq!(request.payload.cron, "@daily");

    // The hand-off marker is persisted with the run.
    let saved = store.load("report").unwrap().unwrap();
    assert_eq!(saved.runs[0].notified, Some(NotifyOutcome::Triggered));
}

#[tokio::test]
async fn success_is_silent_unless_on_success_is_set() {
    init_tracing();

    let silent = TaskBuilder::new("silent", "@daily", "true")
        .notify_on(false, true)
        .build();
    let notifier = Arc::new(RecordingNotifier::new());
    let (run, _) = invoke(silent, Arc::new(FakeExecutor::succeeding()), notifier.clone()).await;
    assert_eq!(run.notified, None);
    assert_eq!(notifier.delivery_count(), 0);

    let chatty = TaskBuilder::new("chatty", "@daily", "true")
        .notify_on(true, false)
        .build();
    let notifier = Arc::new(RecordingNotifier::new());
    let (run, _) = invoke(chatty, Arc::new(FakeExecutor::succeeding()), notifier.clone()).await;
    assert_eq!(run.notified, Some(NotifyOutcome::Triggered));
    assert_eq!(notifier.delivery_count(), 1);
}

#[tokio::test]
async fn failed_hand_off_is_recorded_on_the_run() {
    init_tracing();

    let task = TaskBuilder::new("unlucky", "@daily", "false")
        .notify_on(false, true)
        .build();
    let store = Arc::new(MemoryStore::new());
    store.save(&task).unwrap();

    let run = runner::execute_invocation(
        task,
        store.clone(),
        Arc::new(FakeExecutor::failing(1)),
        Arc::new(FailingNotifier),
        None,
    )
    .await;

    assert_eq!(run.notified, Some(NotifyOutcome::Failed));

    // A failed hand-off never fails the invocation itself.
    let saved = store.load("unlucky").unwrap().unwrap();
    assert_eq!(saved.run_count, 1);
    assert_eq!(saved.runs[0].notified, Some(NotifyOutcome::Failed));
}
