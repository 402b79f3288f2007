//! Fixed-window rate limiter for the chat endpoint.
//!
//! One counter per wall-clock second, shared by all clients.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Clone)]
pub struct RateLimiter {
    max_per_sec: u64,
    count: Arc<AtomicU64>,
    /// Epoch second of the active window.
    window: Arc<AtomicU64>,
}

impl RateLimiter {
    /// `max_per_sec` of zero disables limiting.
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec,
            count: Arc::new(AtomicU64::new(0)),
            window: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn max_per_sec(&self) -> u64 {
        self.max_per_sec
    }

    pub fn try_acquire(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.try_acquire_at(now)
    }

    fn try_acquire_at(&self, second: u64) -> bool {
        if self.max_per_sec == 0 {
            return true;
        }
        let current = self.window.load(Ordering::Acquire);
        if second != current
            && self
                .window
                .compare_exchange(current, second, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            // First request of a new window.
            self.count.store(1, Ordering::Release);
            return true;
        }
        self.count.fetch_add(1, Ordering::AcqRel) < self.max_per_sec
    }
}

/// Rejects requests over the limit with 429.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.chat_limiter.try_acquire() {
        next.run(req).await
    } else {
        tracing::warn!(limit = state.chat_limiter.max_per_sec(), "Chat rate limit exceeded");
        ApiError::TooManyRequests.into_response()
    }
}
