// src/engine/scheduler.rs

//! The tick-driven dispatch loop.
//!
//! State machine: Stopped → Running ⇄ Paused → Stopped. Each tick re-reads
//! the enabled task set from the store (no caching across ticks), evaluates
//! due-ness, and dispatches due tasks that are not already in flight. Stop
//! and pause are cooperative flags checked once per tick; in-flight
//! executions always run to natural completion.
//!
//! The overlap guard is an arena of `name → JoinHandle` owned by the loop;
//! finished entries are reaped every tick, and a live entry blocks
//! re-dispatch of that task name.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{dueness, ControlEvent, RunEvent, SchedulerStatus, SharedState, TaskName};
use crate::errors::{CronrunError, Result};
use crate::exec::{runner, CommandExecutor};
use crate::notify::Notifier;
use crate::schedule::ScheduleSpec;
use crate::store::TaskStore;
use crate::task::{Task, TaskRun};

const CONTROL_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Tick interval of the dispatch loop.
    pub check_interval: Duration,
    /// Maximum number of concurrently executing invocations.
    pub max_parallel: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(1),
            max_parallel: 8,
        }
    }
}

/// Cloneable control surface for a running [`Scheduler`].
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<SharedState>,
    ctrl_tx: mpsc::Sender<ControlEvent>,
    check_interval: Duration,
}

impl SchedulerHandle {
    /// Request a cooperative stop; checked once per tick. In-flight
    /// executions are left untouched.
    pub fn stop(&self) {
        info!("scheduler stop requested");
        self.shared.set_running(false);
    }

    /// Stop evaluating due-ness; the tick timer keeps advancing.
    pub fn pause(&self) {
        info!("scheduler paused");
        self.shared.set_paused(true);
    }

    /// Resume due-ness evaluation. Fires missed slots at most once.
    pub fn resume(&self) {
        info!("scheduler resumed");
        self.shared.set_paused(false);
    }

    /// Execute a task immediately, bypassing enabled/due-ness checks but
    /// not the overlap guard. Resolves once the invocation has finished.
    pub async fn run_task_now(&self, name: &str) -> Result<TaskRun> {
        let (reply, rx) = oneshot::channel();
        self.ctrl_tx
            .send(ControlEvent::RunNow {
                name: name.to_string(),
                reply,
            })
            .await
            .map_err(|_| CronrunError::ControlChannelClosed)?;
        rx.await.map_err(|_| CronrunError::ControlChannelClosed)?
    }

    pub fn status(&self) -> SchedulerStatus {
        self.shared.status(self.check_interval)
    }
}

/// The dispatch loop. Construct, grab a [`SchedulerHandle`], then `run()`.
pub struct Scheduler<S, E, N> {
    store: Arc<S>,
    executor: Arc<E>,
    notifier: Arc<N>,
    config: SchedulerConfig,
    shared: Arc<SharedState>,
    ctrl_tx: mpsc::Sender<ControlEvent>,
    /// Taken out of `self` when the loop starts.
    ctrl_rx: Option<mpsc::Receiver<ControlEvent>>,
    events: Option<mpsc::Sender<RunEvent>>,
    permits: Arc<Semaphore>,
    /// Overlap guard: at most one live entry per task name.
    in_flight: HashMap<TaskName, JoinHandle<()>>,
    /// On-startup tasks already executed this process lifetime.
    startup_done: HashSet<TaskName>,
}

impl<S, E, N> Scheduler<S, E, N>
where
    S: TaskStore + 'static,
    E: CommandExecutor + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        store: Arc<S>,
        executor: Arc<E>,
        notifier: Arc<N>,
        config: SchedulerConfig,
    ) -> Self {
        let (ctrl_tx, ctrl_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        Self {
            store,
            executor,
            notifier,
            shared: Arc::new(SharedState::default()),
            ctrl_tx,
            ctrl_rx: Some(ctrl_rx),
            events: None,
            permits: Arc::new(Semaphore::new(config.max_parallel.max(1))),
            in_flight: HashMap::new(),
            startup_done: HashSet::new(),
            config,
        }
    }

    /// Attach an observer channel receiving a [`RunEvent`] per completed
    /// invocation (non-blocking; events are dropped if the channel is full).
    pub fn with_run_events(mut self, events: mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: Arc::clone(&self.shared),
            ctrl_tx: self.ctrl_tx.clone(),
            check_interval: self.config.check_interval,
        }
    }

    /// Drive the loop until stop is requested.
    ///
    /// The only fatal error is the store being unreachable at startup;
    /// everything after that is logged and survived.
    pub async fn run(mut self) -> Result<()> {
        let initial = self
            .store
            .list_enabled()
            .map_err(|e| CronrunError::StoreUnavailable(e.to_string()))?;

        self.shared.mark_started();
        info!(
            interval_secs = self.config.check_interval.as_secs_f64(),
            tasks = initial.len(),
            "scheduler started"
        );

        self.run_startup_tasks(initial);

        let mut ctrl_rx = self
            .ctrl_rx
            .take()
            .ok_or(CronrunError::ControlChannelClosed)?;
        let mut interval = tokio::time::interval(self.config.check_interval);
        // The first tick of tokio's interval fires immediately.
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !self.shared.is_running() {
                        info!("stop flag set; scheduler loop exiting");
                        break;
                    }
                    self.reap_finished();
                    if self.shared.is_paused() {
                        continue;
                    }
                    if let Err(e) = self.tick() {
                        warn!(error = %e, "scheduler tick failed; continuing");
                    }
                }
                Some(event) = ctrl_rx.recv() => {
                    self.handle_control(event);
                }
            }
        }

        self.drain_in_flight().await;
        info!("scheduler stopped");
        Ok(())
    }

    /// Dispatch every enabled on-startup task exactly once per process
    /// lifetime. The executed-name set is in-memory only.
    fn run_startup_tasks(&mut self, tasks: Vec<Task>) {
        for task in tasks {
            if !ScheduleSpec::is_startup(&task.cron) {
                continue;
            }
            if self.startup_done.contains(&task.name) || self.is_in_flight(&task.name) {
                continue;
            }
            info!(task = %task.name, "executing on-startup task");
            self.startup_done.insert(task.name.clone());
            self.dispatch(task, None);
        }
    }

    /// One tick: re-read the store and dispatch whatever is due.
    fn tick(&mut self) -> Result<()> {
        let now = Utc::now();
        let tasks = self.store.list_enabled()?;

        for task in tasks {
            if ScheduleSpec::is_startup(&task.cron) {
                continue;
            }
            // The store validates on load, so a failure here means the
            // definition changed under us mid-tick; skip it, don't die.
            let spec = match ScheduleSpec::resolve(&task.cron) {
                Ok(spec) => spec,
                Err(e) => {
                    warn!(task = %task.name, error = %e, "skipping task with invalid schedule");
                    continue;
                }
            };
            if !dueness::is_due(&spec, task.last_run, now) {
                continue;
            }
            if self.is_in_flight(&task.name) {
                debug!(task = %task.name, "previous invocation still running; dispatch skipped");
                continue;
            }
            info!(task = %task.name, "task due; dispatching");
            self.dispatch(task, None);
        }

        Ok(())
    }

    fn handle_control(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::RunNow { name, reply } => {
                self.reap_finished();
                if self.is_in_flight(&name) {
                    let _ = reply.send(Err(CronrunError::TaskAlreadyRunning(name)));
                    return;
                }
                match self.store.load(&name) {
                    Ok(Some(task)) => {
                        info!(task = %name, "manual run requested");
                        self.dispatch(task, Some(reply));
                    }
                    Ok(None) => {
                        let _ = reply.send(Err(CronrunError::TaskNotFound(name)));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
        }
    }

    /// Spawn one invocation and register it in the overlap arena.
    fn dispatch(&mut self, task: Task, reply: Option<oneshot::Sender<Result<TaskRun>>>) {
        let name = task.name.clone();
        let store = Arc::clone(&self.store);
        let executor = Arc::clone(&self.executor);
        let notifier = Arc::clone(&self.notifier);
        let events = self.events.clone();
        let shared = Arc::clone(&self.shared);
        let permits = Arc::clone(&self.permits);

        let handle = tokio::spawn(async move {
            // Bounded worker context: wait for a slot here, off the tick
            // loop. The arena entry stays live while we wait, so the
            // overlap guard still holds.
            let _permit = permits.acquire_owned().await.ok();
            let run = runner::execute_invocation(task, store, executor, notifier, events).await;
            shared.note_run_finished();
            if let Some(reply) = reply {
                let _ = reply.send(Ok(run));
            }
        });

        self.in_flight.insert(name, handle);
    }

    fn is_in_flight(&self, name: &str) -> bool {
        self.in_flight
            .get(name)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Remove completed arena entries so the map never grows unbounded.
    fn reap_finished(&mut self) {
        self.in_flight.retain(|_, handle| !handle.is_finished());
    }

    /// Let in-flight executions finish after the loop exits.
    async fn drain_in_flight(&mut self) {
        for (name, handle) in self.in_flight.drain() {
            if handle.is_finished() {
                continue;
            }
            info!(task = %name, "waiting for in-flight run to finish");
            if let Err(e) = handle.await {
                warn!(task = %name, error = %e, "in-flight run panicked");
            }
        }
    }
}
