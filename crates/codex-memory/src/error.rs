//! Error types for memory backends.

/// Errors a [`crate::MemoryStore`] backend may report.
///
/// The bundled in-memory store never produces these; they exist for
/// backends that cross a process or network boundary.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("memory backend unavailable: {0}")]
    Unavailable(String),
    #[error("memory backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MemoryError {
    fn from(err: serde_json::Error) -> Self {
        MemoryError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_error_display() {
        let err = MemoryError::Unavailable("redis down".to_string());
        assert_eq!(err.to_string(), "memory backend unavailable: redis down");

        let err = MemoryError::Backend("write rejected".to_string());
        assert_eq!(err.to_string(), "memory backend error: write rejected");

        let err = MemoryError::Serialization("bad json".to_string());
        assert_eq!(err.to_string(), "serialization error: bad json");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MemoryError = json_err.into();
        assert!(matches!(err, MemoryError::Serialization(_)));
    }
}
