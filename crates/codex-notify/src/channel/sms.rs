//! SMS alerts through an HTTP gateway accepting `{to, message}`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use codex_core::LeadData;

use crate::channel::{configured, post_json, ChannelKind, ChannelOutcome, NotificationChannel};
use crate::error::ChannelError;
use crate::format::sms_text;

pub struct SmsChannel {
    client: Client,
    gateway_url: Option<String>,
    phone: Option<String>,
    enabled: bool,
}

impl SmsChannel {
    pub fn new(
        client: Client,
        gateway_url: Option<String>,
        phone: Option<String>,
        enabled: bool,
    ) -> Self {
        Self {
            client,
            gateway_url,
            phone,
            enabled,
        }
    }
}

#[async_trait]
impl NotificationChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, lead: &LeadData) -> Result<ChannelOutcome, ChannelError> {
        if !self.enabled {
            return Ok(ChannelOutcome::Skipped("disabled".to_string()));
        }
        let (Some(url), Some(to)) = (configured(&self.gateway_url), configured(&self.phone))
        else {
            return Ok(ChannelOutcome::Skipped(
                "no SMS gateway or phone number".to_string(),
            ));
        };

        let body = json!({ "to": to, "message": sms_text(lead) });
        post_json(&self.client, url, &body).await?;

        info!(session = %lead.session_id, "Lead alert sent by SMS");
        Ok(ChannelOutcome::Delivered)
    }
}
