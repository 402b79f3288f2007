use thiserror::Error;

/// Top-level error type shared by the Codex crates.
///
/// Subsystem crates define their own error enums and convert into this one
/// where they cross into configuration or I/O territory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("API server error: {0}")]
    Api(String),
}

impl From<toml::de::Error> for CodexError {
    fn from(err: toml::de::Error) -> Self {
        CodexError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CodexError {
    fn from(err: toml::ser::Error) -> Self {
        CodexError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CodexError {
    fn from(err: serde_json::Error) -> Self {
        CodexError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Codex operations.
pub type Result<T> = std::result::Result<T, CodexError>;
