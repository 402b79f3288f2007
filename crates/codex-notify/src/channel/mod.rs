//! Notification channels and the trait the dispatcher fans out over.

pub mod email;
pub mod lead_store;
pub mod sms;
pub mod webhook;
pub mod whatsapp;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use codex_core::LeadData;

use crate::error::ChannelError;

pub use email::EmailChannel;
pub use lead_store::LeadStoreChannel;
pub use sms::SmsChannel;
pub use webhook::WebhookChannel;
pub use whatsapp::WhatsAppChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Webhook,
    Sms,
    #[serde(rename = "whatsapp")]
    WhatsApp,
    Email,
    LeadStore,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Webhook => write!(f, "webhook"),
            ChannelKind::Sms => write!(f, "sms"),
            ChannelKind::WhatsApp => write!(f, "whatsapp"),
            ChannelKind::Email => write!(f, "email"),
            ChannelKind::LeadStore => write!(f, "lead_store"),
        }
    }
}

/// What a channel did with a lead when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Accepted by the remote endpoint.
    Delivered,
    /// Persisted in the local lead store.
    StoredLocally,
    /// Not attempted: disabled or no destination configured.
    Skipped(String),
}

/// One way of telling a human about a qualified lead.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn send(&self, lead: &LeadData) -> Result<ChannelOutcome, ChannelError>;
}

/// Shared HTTP client for all channels.
pub fn http_client(timeout: Duration) -> Result<Client, ChannelError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ChannelError::Client(e.to_string()))
}

/// POST a JSON body and require a 2xx status.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    body: &serde_json::Value,
) -> Result<(), ChannelError> {
    let response = client.post(url).json(body).send().await?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ChannelError::Status(status.as_u16()))
    }
}

/// Destination that is present and non-blank.
pub(crate) fn configured(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
