pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AiConfig, CodexConfig, ConversationConfig, GeneralConfig, KnowledgeConfig, MemoryConfig,
    NotificationConfig,
};
pub use error::{CodexError, Result};
pub use types::*;
