//! State shared by all route handlers.

use std::sync::Arc;
use std::time::Instant;

use codex_chat::Orchestrator;
use codex_core::GeneralConfig;

use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub general: Arc<GeneralConfig>,
    /// Bearer token for the operator endpoints.
    pub api_token: String,
    pub chat_limiter: RateLimiter,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, general: GeneralConfig, api_token: String) -> Self {
        let chat_limiter = RateLimiter::new(general.chat_rate_limit_per_sec);
        Self {
            orchestrator,
            general: Arc::new(general),
            api_token,
            chat_limiter,
            start_time: Instant::now(),
        }
    }
}
