// src/notify/webhook.rs

//! Webhook delivery over HTTP POST.

use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::{CronrunError, Result};
use crate::notify::{Notifier, NotifyRequest};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Fire-and-forget webhook notifier.
///
/// `deliver` validates the target and spawns the POST; the response status
/// (or error) is only logged. Must be used from within a tokio runtime.
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for WebhookNotifier {
    fn deliver(&self, request: NotifyRequest) -> Result<()> {
        if request.url.trim().is_empty() {
            return Err(CronrunError::Notify(format!(
                "task '{}': webhook url is not configured",
                request.payload.task
            )));
        }
        let url: reqwest::Url = request
            .url
            .parse()
            .map_err(|e| CronrunError::Notify(format!("invalid webhook url '{}': {e}", request.url)))?;

        let mut req = self
            .client
            .post(url.clone())
            .timeout(DELIVERY_TIMEOUT)
            .json(&request.payload);
        if let Some(token) = &request.token {
            req = req.bearer_auth(token);
        }

        let task = request.payload.task.clone();
        tokio::spawn(async move {
            match req.send().await {
                Ok(resp) => {
                    debug!(task = %task, status = %resp.status(), url = %url, "webhook delivered");
                }
                Err(e) => {
                    warn!(task = %task, url = %url, error = %e, "webhook delivery failed");
                }
            }
        });

        Ok(())
    }
}
