//! HTTP API for the lead-qualification chat.
//!
//! Public chat and health endpoints for the website widget, plus
//! token-protected lead and session views for operators.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
