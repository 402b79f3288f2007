//! Bearer-token protection for the operator endpoints.
//!
//! The token lives in `<data_dir>/api_token`; a fresh one is generated on
//! first start. Chat and health stay public.

use std::path::Path;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::Rng;

use crate::error::ApiError;
use crate::state::AppState;

pub const TOKEN_FILE: &str = "api_token";

/// Random 32-character hex token.
pub fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Read the token under `data_dir`, or create and persist a new one.
/// A token that cannot be saved is still used for this run.
pub fn load_or_create_token(data_dir: &Path) -> String {
    let path = data_dir.join(TOKEN_FILE);
    if let Ok(contents) = std::fs::read_to_string(&path) {
        let token = contents.trim();
        if !token.is_empty() {
            tracing::info!(path = %path.display(), "API token loaded");
            return token.to_string();
        }
    }

    let token = generate_token();
    if let Err(e) = write_private(&path, &token) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to save API token");
    } else {
        tracing::info!(path = %path.display(), "API token created");
    }
    token
}

fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;
    let value = value
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;
    value.strip_prefix("Bearer ").ok_or("Expected a bearer token")
}

/// Byte comparison whose duration does not depend on where inputs differ.
fn tokens_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

/// Middleware rejecting requests without the configured bearer token.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match bearer(req.headers()) {
        Ok(token) if tokens_match(token, &state.api_token) => next.run(req).await,
        Ok(_) => ApiError::Unauthorized("Invalid bearer token".to_string()).into_response(),
        Err(reason) => ApiError::Unauthorized(reason.to_string()).into_response(),
    }
}
