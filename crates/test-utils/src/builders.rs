#![allow(dead_code)]

use cronrun::task::{NotifyConfig, RetryPolicy, Task};

/// Builder for `Task` to simplify test setup.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(name: &str, cron: &str, command: &str) -> Self {
        Self {
            task: Task::new(name, cron, command),
        }
    }

    pub fn enabled(mut self, val: bool) -> Self {
        self.task.enabled = val;
        self
    }

    pub fn retry(mut self, max_attempts: u32, delay_seconds: u64) -> Self {
        self.task.retry = RetryPolicy {
            max_attempts,
            delay_seconds,
        };
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.task.timeout_seconds = seconds;
        self
    }

    pub fn max_history(mut self, n: usize) -> Self {
        self.task.max_history = n;
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.task.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.task.environment.insert(key.into(), value.into());
        self
    }

    pub fn notify(mut self, config: NotifyConfig) -> Self {
        self.task.notify = config;
        self
    }

    pub fn notify_on(mut self, on_success: bool, on_failure: bool) -> Self {
        self.task.notify = NotifyConfig {
            enabled: true,
            on_success,
            on_failure,
            url: "http://localhost/hook".into(),
            token: None,
        };
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
