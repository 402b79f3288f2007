//! Types exchanged between the orchestrator, its engines and callers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use codex_core::{Entity, Intent, SessionId, Stage};
use codex_knowledge::ScoredDocument;
use codex_memory::{ConversationSummary, MemoryEntry, MemoryType};
use codex_nlu::Analysis;

use crate::scoring::ScoreFlags;

// =============================================================================
// Engine I/O
// =============================================================================

/// Which engine produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineOrigin {
    Qualification,
    RuleBased,
    /// Fixed reply used when every engine failed.
    LastResort,
    /// An engine reply rewritten by the AI enhancer.
    Enhanced,
}

impl fmt::Display for EngineOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineOrigin::Qualification => write!(f, "qualification"),
            EngineOrigin::RuleBased => write!(f, "rule_based"),
            EngineOrigin::LastResort => write!(f, "last_resort"),
            EngineOrigin::Enhanced => write!(f, "enhanced"),
        }
    }
}

/// Everything an engine may look at for one turn.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: SessionId,
    pub utterance: String,
    pub analysis: Analysis,
    /// Stage before this turn.
    pub stage: Stage,
    /// Lead score after this turn's memories were stored.
    pub score: u32,
    pub flags: ScoreFlags,
    pub summary: Option<ConversationSummary>,
    pub documents: Vec<ScoredDocument>,
    /// Memories retrieved for this turn, most relevant first.
    pub recalled: Vec<MemoryEntry>,
    /// Values remembered from earlier turns, used to fill reply templates.
    pub known: KnownFacts,
    pub qualification_threshold: u32,
}

/// Facts about the visitor gathered over the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownFacts {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub technologies: Vec<String>,
    pub services: Vec<String>,
    pub project: Option<String>,
}

// =============================================================================
// Fact memories
// =============================================================================

pub const BUDGET_FACT: &str = "Budget";
pub const TIMELINE_FACT: &str = "Timeline";
pub const EMAIL_FACT: &str = "Contact email";
pub const PHONE_FACT: &str = "Contact phone";

/// Content of a semantic fact memory, `"<label>: <value>"`.
pub fn fact_content(label: &str, value: &str) -> String {
    format!("{}: {}", label, value)
}

/// Newest value stored under `label` among semantic memories.
pub fn recalled_fact<'a>(recalled: &'a [MemoryEntry], label: &str) -> Option<&'a str> {
    recalled
        .iter()
        .filter(|e| e.memory_type == MemoryType::Semantic)
        .filter_map(|e| {
            let value = e.content.strip_prefix(label)?.strip_prefix(": ")?;
            Some((e.timestamp, value))
        })
        .max_by_key(|(timestamp, _)| *timestamp)
        .map(|(_, value)| value)
}

/// Reply produced by a conversation engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineResponse {
    pub message: String,
    pub quick_replies: Vec<String>,
    pub next_stage: Stage,
    pub score_delta: u32,
    /// Score flags after this turn.
    pub flags: ScoreFlags,
    pub should_notify: bool,
    pub origin: EngineOrigin,
    pub confidence: f32,
}

// =============================================================================
// Caller-facing types
// =============================================================================

/// Result of one utterance.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub session_id: SessionId,
    pub message: String,
    pub quick_replies: Vec<String>,
    pub stage: Stage,
    pub score: u32,
    /// `None` when the input was empty and nothing was analyzed.
    pub intent: Option<Intent>,
    pub entities: Vec<Entity>,
    /// This turn handed the lead to the notification dispatcher.
    pub notified: bool,
    pub origin: EngineOrigin,
}

/// Full view of one session for operators.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub stage: Stage,
    pub score: u32,
    pub turns: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub notified_at: Option<DateTime<Utc>>,
    pub flags: ScoreFlags,
    pub facts: KnownFacts,
    pub intent_history: Vec<Intent>,
    pub summary: Option<ConversationSummary>,
}

/// One line of the session listing.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub stage: Stage,
    pub score: u32,
    pub turns: u32,
    pub last_activity: DateTime<Utc>,
    pub notified: bool,
}
