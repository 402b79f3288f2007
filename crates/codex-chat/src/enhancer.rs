//! Optional AI rewrite of template replies.
//!
//! The enhancer receives the draft reply, the stage and the visitor's
//! utterance and returns a reworded message. Any failure keeps the draft.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::json;

use codex_core::{AiConfig, Stage};

use crate::error::{ChatError, EngineError};

/// Something that can reword a reply.
#[async_trait]
pub trait ReplyEnhancer: Send + Sync {
    async fn enhance(
        &self,
        draft: &str,
        stage: Stage,
        utterance: &str,
    ) -> Result<String, EngineError>;
}

#[derive(Deserialize)]
struct EnhancerReply {
    message: Option<String>,
}

/// Enhancer backed by an HTTP endpoint taking `{message, stage, utterance}`
/// and answering `{message}`.
pub struct HttpEnhancer {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpEnhancer {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Enhancer(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// `None` unless both endpoint and API key are configured.
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>, ChatError> {
        match (&config.endpoint, &config.api_key) {
            (Some(endpoint), Some(key))
                if !endpoint.trim().is_empty() && !key.trim().is_empty() =>
            {
                let enhancer = Self::new(
                    endpoint.trim(),
                    key.trim(),
                    Duration::from_millis(config.timeout_ms.max(1)),
                )?;
                Ok(Some(enhancer))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ReplyEnhancer for HttpEnhancer {
    async fn enhance(
        &self,
        draft: &str,
        stage: Stage,
        utterance: &str,
    ) -> Result<String, EngineError> {
        let payload = json!({
            "message": draft,
            "stage": stage,
            "utterance": utterance,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EngineError::Http(format!("status {}", status.as_u16())));
        }

        let body: EnhancerReply = resp
            .json()
            .await
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))?;
        match body.message.map(|m| m.trim().to_string()) {
            Some(message) if !message.is_empty() => Ok(message),
            _ => Err(EngineError::InvalidResponse("missing message".to_string())),
        }
    }
}
