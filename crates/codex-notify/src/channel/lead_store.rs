//! Lead-store API with local persistence when it cannot be reached.
//!
//! This channel never returns an error: a rejected or unreachable remote
//! store, or no remote store at all, lands the lead in the
//! [`LocalLeadStore`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use codex_core::LeadData;

use crate::channel::{configured, post_json, ChannelKind, ChannelOutcome, NotificationChannel};
use crate::error::ChannelError;
use crate::local_store::LocalLeadStore;

pub struct LeadStoreChannel {
    client: Client,
    url: Option<String>,
    enabled: bool,
    local: Arc<LocalLeadStore>,
}

impl LeadStoreChannel {
    pub fn new(
        client: Client,
        url: Option<String>,
        enabled: bool,
        local: Arc<LocalLeadStore>,
    ) -> Self {
        Self {
            client,
            url,
            enabled,
            local,
        }
    }

    fn store_locally(&self, lead: &LeadData) -> ChannelOutcome {
        match self.local.append(lead) {
            Some(record) => {
                info!(session = %lead.session_id, id = %record.id, "Lead stored locally");
                ChannelOutcome::StoredLocally
            }
            None => ChannelOutcome::Skipped("local store has no capacity".to_string()),
        }
    }
}

#[async_trait]
impl NotificationChannel for LeadStoreChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::LeadStore
    }

    async fn send(&self, lead: &LeadData) -> Result<ChannelOutcome, ChannelError> {
        if !self.enabled {
            return Ok(ChannelOutcome::Skipped("disabled".to_string()));
        }
        let Some(url) = configured(&self.url) else {
            return Ok(self.store_locally(lead));
        };

        let body = match serde_json::to_value(lead) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to encode lead for lead store");
                return Ok(self.store_locally(lead));
            }
        };

        match post_json(&self.client, url, &body).await {
            Ok(()) => {
                info!(session = %lead.session_id, "Lead sent to lead store");
                Ok(ChannelOutcome::Delivered)
            }
            Err(e) => {
                warn!(session = %lead.session_id, error = %e, "Lead store unavailable, keeping lead locally");
                Ok(self.store_locally(lead))
            }
        }
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
    async fn test_remote_store_accepts_lead() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/leads"))
            .and(body_partial_json(serde_json::json!({"session_id": "sess-42"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let local = Arc::new(LocalLeadStore::in_memory(10));
        let channel = LeadStoreChannel::new(
            client(),
            Some(format!("{}/leads", server.uri())),
            true,
            local.clone(),
        );
        assert_eq!(
            channel.send(&sample_lead()).await.unwrap(),
            ChannelOutcome::Delivered
        );
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_stores_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let local = Arc::new(LocalLeadStore::in_memory(10));
        let channel = LeadStoreChannel::new(client(), Some(server.uri()), true, local.clone());
        assert_eq!(
            channel.send(&sample_lead()).await.unwrap(),
            ChannelOutcome::StoredLocally
        );
        assert_eq!(local.len(), 1);
        assert!(local.list()[0].stored_locally);
    }

    #[tokio::test]
    async fn test_unconfigured_stores_locally() {
        let local = Arc::new(LocalLeadStore::in_memory(10));
        let channel = LeadStoreChannel::new(client(), None, true, local.clone());
        assert_eq!(
            channel.send(&sample_lead()).await.unwrap(),
            ChannelOutcome::StoredLocally
        );
        assert_eq!(local.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_touches_nothing() {
        let local = Arc::new(LocalLeadStore::in_memory(10));
        let channel = LeadStoreChannel::new(client(), None, false, local.clone());
        assert!(matches!(
            channel.send(&sample_lead()).await.unwrap(),
            ChannelOutcome::Skipped(_)
        ));
        assert!(local.is_empty());
    }
}
