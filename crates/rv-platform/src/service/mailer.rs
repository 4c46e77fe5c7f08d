//! Mail transport
//!
//! Outbound mail goes through an HTTP mail relay. Without a relay URL the
//! platform falls back to [`LogMailer`], which only records the message.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::MailConfig;
use crate::error::{PlatformError, Result};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail relay rejected the message with status {status}")]
    Rejected { status: u16 },

    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail send timed out after {0:?}")]
    Timeout(Duration),
}

impl MailError {
    /// Client errors from the relay will not succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            MailError::Rejected { status } => *status >= 500 || *status == 429,
            MailError::Transport(_) | MailError::Timeout(_) => true,
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> std::result::Result<(), MailError>;
}

/// Relay request payload
#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

pub struct HttpMailer {
    client: reqwest::Client,
    relay_url: String,
    relay_token: Option<String>,
    sender: String,
    timeout: Duration,
}

impl HttpMailer {
    pub fn new(relay_url: impl Into<String>, config: &MailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PlatformError::configuration(format!("Failed to build mail client: {}", e)))?;

        Ok(Self {
            client,
            relay_url: relay_url.into(),
            relay_token: config.relay_token.clone(),
            sender: config.sender.clone(),
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> std::result::Result<(), MailError> {
        let message = RelayMessage {
            from: &self.sender,
            to: recipient,
            subject,
            text: body,
        };

        debug!(recipient = %recipient, "Sending mail via relay");
        let mut request = self.client.post(&self.relay_url).json(&message);
        if let Some(ref token) = self.relay_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MailError::Timeout(self.timeout)
            } else {
                MailError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Mail relay rejected message");
            Err(MailError::Rejected { status: status.as_u16() })
        }
    }
}

/// Records messages in the log instead of sending them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> std::result::Result<(), MailError> {
        info!(recipient = %recipient, subject = %subject, body_len = body.len(), "Mail (log only)");
        Ok(())
    }
}
