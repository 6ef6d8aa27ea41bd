//! ntfy-style webhook notifications

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use crate::clients::{Notifier, ProviderError, ProviderResult, http_client};

/// Body sent when the caller passes an empty message
pub const DEFAULT_MESSAGE: &str = "Work time notification";
pub const NOTIFICATION_TITLE: &str = "Worktime Reminder";

/// Webhook client posting plain-text alarms
#[derive(Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn send(&self, url: &str, message: &str) -> ProviderResult<()> {
        if url.is_empty() {
            return Err(ProviderError::EmptyUrl);
        }

        let message = if message.is_empty() {
            DEFAULT_MESSAGE
        } else {
            message
        };

        info!("Sending notification to: {}", url);

        let response = self
            .http
            .post(url)
            .header("Title", NOTIFICATION_TITLE)
            .header("Priority", "urgent")
            .header("Tags", "warning,skull")
            .header("Content-Type", "text/plain")
            .body(message.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        info!("Webhook response status: {}, body: {}", status, body);

        if !status.is_success() {
            return Err(ProviderError::Status {
                service: "webhook",
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
