//! Generic JSON webhook (CRM, Slack relay, Zapier, ...).

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::info;

use codex_core::LeadData;

use crate::channel::{configured, post_json, ChannelKind, ChannelOutcome, NotificationChannel};
use crate::error::ChannelError;
use crate::format::webhook_payload;

pub struct WebhookChannel {
    client: Client,
    url: Option<String>,
    enabled: bool,
}

impl WebhookChannel {
    pub fn new(client: Client, url: Option<String>, enabled: bool) -> Self {
        Self {
            client,
            url,
            enabled,
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    async fn send(&self, lead: &LeadData) -> Result<ChannelOutcome, ChannelError> {
        if !self.enabled {
            return Ok(ChannelOutcome::Skipped("disabled".to_string()));
        }
        let Some(url) = configured(&self.url) else {
            return Ok(ChannelOutcome::Skipped("no webhook URL".to_string()));
        };

        let payload = webhook_payload(lead, Utc::now())?;
        post_json(&self.client, url, &payload).await?;

        info!(session = %lead.session_id, "Lead sent to webhook");
        Ok(ChannelOutcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::sample_lead;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        crate::channel::http_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_webhook_posts_event_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "event": "qualified_lead",
                "lead": {"session_id": "sess-42", "score": 65}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WebhookChannel::new(client(), Some(format!("{}/hook", server.uri())), true);
        let outcome = channel.send(&sample_lead()).await.unwrap();
        assert_eq!(outcome, ChannelOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_webhook_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let channel = WebhookChannel::new(client(), Some(server.uri()), true);
        let err = channel.send(&sample_lead()).await.unwrap_err();
        assert!(matches!(err, ChannelError::Status(500)));
    }

    #[tokio::test]
    async fn test_webhook_skipped_without_url_or_when_disabled() {
        let channel = WebhookChannel::new(client(), None, true);
        assert!(matches!(
            channel.send(&sample_lead()).await.unwrap(),
            ChannelOutcome::Skipped(_)
        ));

        let channel = WebhookChannel::new(client(), Some("http://127.0.0.1:9".to_string()), false);
        assert_eq!(
            channel.send(&sample_lead()).await.unwrap(),
            ChannelOutcome::Skipped("disabled".to_string())
        );
    }
}
