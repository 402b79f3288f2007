//! Conversation orchestration for lead qualification.
//!
//! Drives each visitor utterance through analysis, memory, knowledge
//! lookup, the engine pipeline and, once a lead qualifies, notification.

pub mod engine;
pub mod enhancer;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod qualification;
pub mod response;
pub mod scoring;
pub mod session;
pub mod stage;
pub mod types;

pub use engine::{ConversationEngine, EnginePipeline, LAST_RESORT_MESSAGE};
pub use enhancer::{HttpEnhancer, ReplyEnhancer};
pub use error::{ChatError, EngineError};
pub use fallback::RuleBasedEngine;
pub use orchestrator::{Orchestrator, CLARIFICATION_PROMPT};
pub use qualification::QualificationEngine;
pub use response::{Placeholders, ResponseGenerator};
pub use scoring::{is_qualified, score_turn, ScoreFlags, TurnScore};
pub use session::{SessionRegistry, SessionState};
pub use stage::{next_actions, next_stage, validate_transition};
pub use types::{
    EngineOrigin, EngineResponse, KnownFacts, SessionInfo, SessionSnapshot, TurnContext,
    TurnResponse,
};
