//! Email alerts through a transactional mail API accepting
//! `{to, subject, html}`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use codex_core::LeadData;

use crate::channel::{configured, post_json, ChannelKind, ChannelOutcome, NotificationChannel};
use crate::error::ChannelError;
use crate::format::{email_html, email_subject};

pub struct EmailChannel {
    client: Client,
    api_url: Option<String>,
    to: Option<String>,
    enabled: bool,
}

impl EmailChannel {
    pub fn new(client: Client, api_url: Option<String>, to: Option<String>, enabled: bool) -> Self {
        Self {
            client,
            api_url,
            to,
            enabled,
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, lead: &LeadData) -> Result<ChannelOutcome, ChannelError> {
        if !self.enabled {
            return Ok(ChannelOutcome::Skipped("disabled".to_string()));
        }
        let (Some(url), Some(to)) = (configured(&self.api_url), configured(&self.to)) else {
            return Ok(ChannelOutcome::Skipped(
                "no email API or recipient".to_string(),
            ));
        };

        let body = json!({
            "to": to,
            "subject": email_subject(lead),
            "html": email_html(lead),
        });
        post_json(&self.client, url, &body).await?;

        info!(session = %lead.session_id, to = %to, "Lead alert sent by email");
        Ok(ChannelOutcome::Delivered)
    }
}
