//! Error types for notification channels.

/// Why a channel failed to deliver a lead.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Endpoint rejected request with status {0}")]
    Status(u16),
    #[error("Payload error: {0}")]
    Payload(String),
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ChannelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChannelError::Timeout
        } else if err.is_connect() {
            ChannelError::Unreachable(err.to_string())
        } else {
            ChannelError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        ChannelError::Payload(err.to_string())
    }
}
