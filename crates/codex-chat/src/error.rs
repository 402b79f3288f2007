//! Error types for the conversation orchestrator and its engines.

use codex_core::Stage;

/// Errors from building the orchestrator or moving a session between
/// stages. None of these reach the visitor.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid stage transition from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },
    #[error("notification setup failed: {0}")]
    Notification(String),
    #[error("enhancer setup failed: {0}")]
    Enhancer(String),
}

/// Why a conversation engine produced no reply.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("no template for stage {0}")]
    NoTemplate(Stage),
    #[error("enhancer request failed: {0}")]
    Http(String),
    #[error("enhancer timed out")]
    Timeout,
    #[error("invalid enhancer response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::Timeout
        } else {
            EngineError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::InvalidTransition {
            from: Stage::Proposal,
            to: Stage::Discovery,
        };
        assert_eq!(
            err.to_string(),
            "invalid stage transition from proposal to discovery"
        );

        let err = ChatError::Notification("invalid client".to_string());
        assert_eq!(err.to_string(), "notification setup failed: invalid client");
    }

    #[test]
    fn test_engine_error_display() {
        assert_eq!(
            EngineError::Unavailable("offline".to_string()).to_string(),
            "engine unavailable: offline"
        );
        assert_eq!(
            EngineError::NoTemplate(Stage::Analysis).to_string(),
            "no template for stage analysis"
        );
        assert_eq!(EngineError::Timeout.to_string(), "enhancer timed out");
        assert_eq!(
            EngineError::InvalidResponse("missing message".to_string()).to_string(),
            "invalid enhancer response: missing message"
        );
    }
}
