//! Outgoing notifications
//!
//! Delivery itself belongs to a separate sending service; this module only
//! hands it an address and a message.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, address: &str, message: &str) -> Result<(), NotifyError>;
}

/// Writes the notification to the log instead of delivering it
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, address: &str, _message: &str) -> Result<(), NotifyError> {
        tracing::info!(email = %address, "Notification delivery not configured, skipping send");
        Ok(())
    }
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    email: &'a str,
    message: &'a str,
}

/// Posts notifications to an HTTP sending service
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    http_client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, address: &str, message: &str) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&EmailRequest {
                email: address,
                message,
            })
            .send()
            .await
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::SendFailed(format!(
                "sending service responded with {}",
                response.status()
            )));
        }

        tracing::info!(email = %address, "Notification sent");
        Ok(())
    }
}
