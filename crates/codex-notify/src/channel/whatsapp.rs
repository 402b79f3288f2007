//! WhatsApp alerts through a messaging bridge accepting `{to, message}`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use codex_core::LeadData;

use crate::channel::{configured, post_json, ChannelKind, ChannelOutcome, NotificationChannel};
use crate::error::ChannelError;
use crate::format::whatsapp_text;

pub struct WhatsAppChannel {
    client: Client,
    bridge_url: Option<String>,
    phone: Option<String>,
    enabled: bool,
}

impl WhatsAppChannel {
    pub fn new(
        client: Client,
        bridge_url: Option<String>,
        phone: Option<String>,
        enabled: bool,
    ) -> Self {
        Self {
            client,
            bridge_url,
            phone,
            enabled,
        }
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WhatsApp
    }

    async fn send(&self, lead: &LeadData) -> Result<ChannelOutcome, ChannelError> {
        if !self.enabled {
            return Ok(ChannelOutcome::Skipped("disabled".to_string()));
        }
        let (Some(url), Some(to)) = (configured(&self.bridge_url), configured(&self.phone)) else {
            return Ok(ChannelOutcome::Skipped(
                "no WhatsApp bridge or phone number".to_string(),
            ));
        };

        // Bridges expect the number without the leading plus.
        let to = to.trim_start_matches('+');
        let body = json!({ "to": to, "message": whatsapp_text(lead) });
        post_json(&self.client, url, &body).await?;

        info!(session = %lead.session_id, "Lead alert sent by WhatsApp");
        Ok(ChannelOutcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::sample_lead;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        crate::channel::http_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_whatsapp_strips_plus_from_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "to": "15550100" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(
            client(),
            Some(server.uri()),
            Some("+15550100".to_string()),
            true,
        );
        assert_eq!(
            channel.send(&sample_lead()).await.unwrap(),
            ChannelOutcome::Delivered
        );
    }

    #[tokio::test]
    async fn test_whatsapp_unreachable_bridge() {
        let channel = WhatsAppChannel::new(
            client(),
            Some("http://127.0.0.1:9/wa".to_string()),
            Some("+15550100".to_string()),
            true,
        );
        let err = channel.send(&sample_lead()).await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Unreachable(_) | ChannelError::Network(_)
        ));
    }
}
