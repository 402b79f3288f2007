//! Tiered conversation memory with a rolling per-session summary.

pub mod error;
pub mod manager;
pub mod store;
pub mod summary;
pub mod types;

pub use error::{MemoryError, Result};
pub use manager::{CleanupReport, MemoryManager, PROTECTED_IMPORTANCE, RETRIEVE_LIMIT};
pub use store::{InMemoryStore, MemoryStore};
pub use types::{
    ConversationSummary, MemoryEntry, MemoryType, NewMemory, TechnicalLevel, UserProfile,
};
