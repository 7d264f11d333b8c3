// src/task/validate.rs

//! Task validation at the store boundary.
//!
//! Both `save` and `load` run these checks, so a malformed definition is
//! rejected before it ever reaches the scheduler: inside the dispatch loop
//! and the execution engine, every task is assumed well-formed.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{CronrunError, Result};
use crate::schedule::ScheduleSpec;
use crate::task::model::Task;

fn invalid_name_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("static regex"))
}

fn env_key() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("static regex"))
}

/// Validate a task definition.
pub fn validate_task(task: &Task) -> Result<()> {
    if task.name.trim().is_empty() {
        return Err(CronrunError::Validation("task name cannot be empty".into()));
    }
    if invalid_name_chars().is_match(&task.name) {
        return Err(CronrunError::Validation(format!(
            "task name '{}' contains invalid characters",
            task.name
        )));
    }

    if task.command.trim().is_empty() {
        return Err(CronrunError::Validation(format!(
            "task '{}' has an empty command",
            task.name
        )));
    }

    // Alias table lookup + cron parse; also covers `@reboot`.
    ScheduleSpec::resolve(&task.cron)?;

    for key in task.environment.keys() {
        if !env_key().is_match(key) {
            return Err(CronrunError::Validation(format!(
                "task '{}' has invalid environment variable name '{}'",
                task.name, key
            )));
        }
    }

    if !(1..=10).contains(&task.retry.max_attempts) {
        return Err(CronrunError::Validation(format!(
            "task '{}': retry.max_attempts must be in 1..=10 (got {})",
            task.name, task.retry.max_attempts
        )));
    }

    if !(1..=10).contains(&task.priority) {
        return Err(CronrunError::Validation(format!(
            "task '{}': priority must be in 1..=10 (got {})",
            task.name, task.priority
        )));
    }

    if task.max_history == 0 {
        return Err(CronrunError::Validation(format!(
            "task '{}': max_history must be >= 1",
            task.name
        )));
    }

    Ok(())
}
