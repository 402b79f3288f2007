//! Router and server startup.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use codex_core::{CodexError, GeneralConfig};

use crate::handlers;
use crate::state::AppState;
use crate::{auth, rate_limit};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Origins allowed by CORS: the configured list, or the localhost origins
/// of the API port when none is configured. Unparseable entries are
/// skipped with a warning.
pub fn cors_origins(general: &GeneralConfig) -> Vec<HeaderValue> {
    let configured: Vec<String> = if general.cors_origins.is_empty() {
        vec![
            format!("http://127.0.0.1:{}", general.port),
            format!("http://localhost:{}", general.port),
        ]
    } else {
        general.cors_origins.clone()
    };

    configured
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(cors_origins(&state.general)))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let chat_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ));

    let protected_routes = Router::new()
        .route("/leads", get(handlers::leads))
        .route("/sessions", get(handlers::sessions))
        .route("/sessions/{id}", get(handlers::session))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(chat_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `bind_address:port` and serve until the listener fails.
pub async fn start_server(state: AppState) -> Result<(), CodexError> {
    let addr = format!("{}:{}", state.general.bind_address, state.general.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CodexError::Api(format!("failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "API server listening");
    axum::serve(listener, create_router(state))
        .await
        .map_err(|e| CodexError::Api(format!("server error: {}", e)))
}
