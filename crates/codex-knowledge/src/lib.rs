//! RAG-lite knowledge retrieval over a small static corpus.

pub mod corpus;
pub mod document;
pub mod error;
pub mod retriever;

pub use document::{Category, Document, ScoredDocument};
pub use error::KnowledgeError;
pub use retriever::{contextual_sentence, retrieve_with_timeout, KnowledgeBase, KnowledgeRetriever};
