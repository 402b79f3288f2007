//! Shared domain types for the lead-qualification pipeline.
//!
//! Everything that crosses a crate boundary lives here: session ids,
//! NLU output (intents and entities), funnel stages and the lead snapshot
//! handed to the notification dispatcher.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Session
// =============================================================================

/// Opaque identifier of a conversation session.
///
/// Sessions are created implicitly on the first utterance; the id is chosen
/// by the caller (the web widget) or generated by the API layer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// Intent
// =============================================================================

/// Classified purpose of a single utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Greeting,
    Question,
    Request,
    Objection,
    Interest,
    Booking,
    Goodbye,
}

impl IntentType {
    pub const ALL: [IntentType; 7] = [
        IntentType::Greeting,
        IntentType::Question,
        IntentType::Request,
        IntentType::Objection,
        IntentType::Interest,
        IntentType::Booking,
        IntentType::Goodbye,
    ];

    /// Whether this intent expresses buying interest and may move the funnel
    /// forward on confidence alone.
    pub fn is_qualifying(&self) -> bool {
        matches!(
            self,
            IntentType::Interest | IntentType::Booking | IntentType::Request
        )
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentType::Greeting => write!(f, "greeting"),
            IntentType::Question => write!(f, "question"),
            IntentType::Request => write!(f, "request"),
            IntentType::Objection => write!(f, "objection"),
            IntentType::Interest => write!(f, "interest"),
            IntentType::Booking => write!(f, "booking"),
            IntentType::Goodbye => write!(f, "goodbye"),
        }
    }
}

impl std::str::FromStr for IntentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greeting" => Ok(IntentType::Greeting),
            "question" => Ok(IntentType::Question),
            "request" => Ok(IntentType::Request),
            "objection" => Ok(IntentType::Objection),
            "interest" => Ok(IntentType::Interest),
            "booking" => Ok(IntentType::Booking),
            "goodbye" => Ok(IntentType::Goodbye),
            _ => Err(format!("Unknown intent type: {}", s)),
        }
    }
}

/// Coarse polarity of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// How soon the visitor wants something to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
        }
    }
}

/// NLU verdict for one utterance. Produced fresh per utterance, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentType,
    pub confidence: f32,
    pub sentiment: Sentiment,
    pub urgency: Urgency,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Entity
// =============================================================================

/// Kinds of spans the analyzer extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Project,
    Technology,
    Service,
    Timeline,
    Budget,
    Person,
    Company,
}

impl EntityType {
    /// Entity kinds that show the visitor has a concrete project in mind.
    pub fn is_qualifying(&self) -> bool {
        matches!(
            self,
            EntityType::Budget | EntityType::Timeline | EntityType::Project | EntityType::Service
        )
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Project => write!(f, "project"),
            EntityType::Technology => write!(f, "technology"),
            EntityType::Service => write!(f, "service"),
            EntityType::Timeline => write!(f, "timeline"),
            EntityType::Budget => write!(f, "budget"),
            EntityType::Person => write!(f, "person"),
            EntityType::Company => write!(f, "company"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(EntityType::Project),
            "technology" => Ok(EntityType::Technology),
            "service" => Ok(EntityType::Service),
            "timeline" => Ok(EntityType::Timeline),
            "budget" => Ok(EntityType::Budget),
            "person" => Ok(EntityType::Person),
            "company" => Ok(EntityType::Company),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}

/// A typed span extracted from an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub value: String,
    pub confidence: f32,
}

impl Entity {
    /// Tag form used by the memory layer, e.g. `technology:react`.
    pub fn tag(&self) -> String {
        format!("{}:{}", self.kind, self.value.to_lowercase())
    }
}

// =============================================================================
// Stage
// =============================================================================

/// Position of a session in the qualification funnel.
///
/// Declaration order is funnel order; `Ord` is used to clamp transitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Greeting,
    Discovery,
    Qualification,
    Analysis,
    Proposal,
    Conversion,
    Complete,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Greeting,
        Stage::Discovery,
        Stage::Qualification,
        Stage::Analysis,
        Stage::Proposal,
        Stage::Conversion,
        Stage::Complete,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Greeting => write!(f, "greeting"),
            Stage::Discovery => write!(f, "discovery"),
            Stage::Qualification => write!(f, "qualification"),
            Stage::Analysis => write!(f, "analysis"),
            Stage::Proposal => write!(f, "proposal"),
            Stage::Conversion => write!(f, "conversion"),
            Stage::Complete => write!(f, "complete"),
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greeting" => Ok(Stage::Greeting),
            "discovery" => Ok(Stage::Discovery),
            "qualification" => Ok(Stage::Qualification),
            "analysis" => Ok(Stage::Analysis),
            "proposal" => Ok(Stage::Proposal),
            "conversion" => Ok(Stage::Conversion),
            "complete" => Ok(Stage::Complete),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

// =============================================================================
// Lead snapshot
// =============================================================================

/// Contact details gathered during the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.company.is_none()
    }
}

/// What the visitor wants built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub project_type: Option<String>,
    pub technologies: Vec<String>,
    pub services: Vec<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub urgency: Urgency,
}

/// Immutable snapshot of a session judged ready for human follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadData {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub contact_info: ContactInfo,
    pub project_details: ProjectDetails,
    pub conversation_summary: String,
    pub score: u32,
    pub ready_for_proposal: bool,
}
