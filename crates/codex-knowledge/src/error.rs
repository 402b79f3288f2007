//! Error types for the knowledge retriever.

/// Errors from loading or querying the knowledge corpus.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("corpus I/O error: {0}")]
    Io(String),
    #[error("corpus parse error: {0}")]
    Parse(String),
    #[error("duplicate document id: {0}")]
    DuplicateId(String),
    #[error("retrieval timed out after {0} ms")]
    Timeout(u64),
}
