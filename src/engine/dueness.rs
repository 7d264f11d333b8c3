// src/engine/dueness.rs

//! Pure due-ness evaluation.
//!
//! The rule: a task's next fire time is the first schedule slot strictly
//! after its last run (or the Unix epoch if it has never run); the task is
//! due iff `now >= next_fire`. This collapses any number of slots missed
//! while paused or stopped into a single firing; there is no catch-up.

use chrono::{DateTime, Utc};

use crate::schedule::ScheduleSpec;
use crate::task::Task;

/// Next fire time for a resolved schedule, relative to `last_run`.
///
/// `None` for on-startup schedules and for expressions that cannot fire.
pub fn next_fire(spec: &ScheduleSpec, last_run: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match spec {
        ScheduleSpec::OnStartup => None,
        ScheduleSpec::Cron(expr) => {
            let base = last_run.unwrap_or(DateTime::UNIX_EPOCH);
            expr.next_after(base)
        }
    }
}

/// Whether a schedule is due at `now`.
pub fn is_due(spec: &ScheduleSpec, last_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    next_fire(spec, last_run).is_some_and(|next| now >= next)
}

/// Next fire time for a task, for status displays.
///
/// `None` for disabled tasks, on-startup tasks, and unresolvable schedules.
pub fn task_next_fire(task: &Task) -> Option<DateTime<Utc>> {
    if !task.enabled {
        return None;
    }
    let spec = ScheduleSpec::resolve(&task.cron).ok()?;
    next_fire(&spec, task.last_run)
}
