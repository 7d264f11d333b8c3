use std::sync::Mutex;

use cronrun::errors::{CronrunError, Result};
use cronrun::notify::{Notifier, NotifyRequest};

/// A notifier that records every hand-off and always accepts it.
#[derive(Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<NotifyRequest>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn deliveries(&self) -> Vec<NotifyRequest> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, request: NotifyRequest) -> Result<()> {
        self.deliveries.lock().unwrap().push(request);
        Ok(())
    }
}

/// A notifier whose hand-off always fails.
#[derive(Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn deliver(&self, request: NotifyRequest) -> Result<()> {
        Err(CronrunError::Notify(format!(
            "refusing hand-off for task '{}'",
            request.payload.task
        )))
    }
}
