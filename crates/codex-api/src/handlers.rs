//! Route handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use codex_chat::{SessionInfo, SessionSnapshot, TurnResponse};
use codex_core::SessionId;
use codex_notify::{DispatchStatsSnapshot, StoredLead};

use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted caller-chosen session id.
pub const MAX_SESSION_ID_LEN: usize = 128;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct LeadsResponse {
    pub leads: Vec<StoredLead>,
    pub total: usize,
    pub stats: DispatchStatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionInfo>,
    pub total: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /chat - process one visitor message.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("message must not be empty".to_string()))?;

    let session_id = match req.session_id.as_deref().map(str::trim) {
        Some(id) if id.len() > MAX_SESSION_ID_LEN => {
            return Err(ApiError::BadRequest(format!(
                "session_id longer than {} bytes",
                MAX_SESSION_ID_LEN
            )));
        }
        Some(id) if !id.is_empty() => SessionId::from(id),
        _ => SessionId::generate(),
    };

    let turn = state
        .orchestrator
        .process_utterance(&session_id, &message)
        .await;
    Ok(Json(turn))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.orchestrator.session_count(),
    })
}

/// GET /leads - leads kept in the local fallback store, newest last.
pub async fn leads(State(state): State<AppState>) -> Result<Json<LeadsResponse>, ApiError> {
    let dispatcher = state
        .orchestrator
        .dispatcher()
        .ok_or_else(|| ApiError::ServiceUnavailable("notifications are not configured".to_string()))?;
    let leads = dispatcher.local_store().list();
    Ok(Json(LeadsResponse {
        total: leads.len(),
        leads,
        stats: dispatcher.stats(),
    }))
}

/// GET /sessions
pub async fn sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    let sessions = state.orchestrator.list_sessions().await;
    Json(SessionsResponse {
        total: sessions.len(),
        sessions,
    })
}

/// GET /sessions/{id}
pub async fn session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    state
        .orchestrator
        .session_snapshot(&SessionId::from(id.as_str()))
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("session {} not found", id)))
}
