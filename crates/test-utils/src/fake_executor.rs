use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use cronrun::exec::{CommandExecutor, ExecRequest, ExecutionResult};

/// A fake executor that:
/// - records every `ExecRequest` it receives
/// - optionally sleeps to simulate a slow process
/// - returns scripted results in order, falling back to a default.
pub struct FakeExecutor {
    calls: Mutex<Vec<ExecRequest>>,
    scripted: Mutex<VecDeque<ExecutionResult>>,
    default_result: ExecutionResult,
    latency: Option<Duration>,
}

impl FakeExecutor {
    /// Every attempt succeeds with exit code 0.
    pub fn succeeding() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            default_result: success("ok"),
            latency: None,
        }
    }

    /// Every attempt fails with the given exit code.
    pub fn failing(exit_code: i32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            default_result: failure_with_code(exit_code),
            latency: None,
        }
    }

    /// Sleep this long inside every attempt (simulates a slow process).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue a result for the next attempt; once the queue is drained,
    /// attempts fall back to the default result.
    pub fn push_result(&self, result: ExecutionResult) {
        self.scripted.lock().unwrap().push_back(result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.command.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<ExecRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandExecutor for FakeExecutor {
    fn spawn(
        &self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + '_>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(request);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.scripted
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default_result.clone())
        })
    }
}

/// A successful result with the given stdout.
pub fn success(stdout: &str) -> ExecutionResult {
    ExecutionResult {
        success: true,
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// A failed result with the given exit code.
pub fn failure_with_code(exit_code: i32) -> ExecutionResult {
    ExecutionResult {
        success: false,
        exit_code: Some(exit_code),
        stdout: String::new(),
        stderr: format!("exit {exit_code}"),
    }
}
