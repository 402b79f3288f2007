//! Memory entries and the per-session conversation summary.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use codex_core::{Sentiment, SessionId};

/// Lowest and highest importance a memory can carry.
pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 10;

/// Weights of the retrieval score.
pub const IMPORTANCE_WEIGHT: f64 = 0.7;
pub const RECENCY_WEIGHT: f64 = 0.3;

// =============================================================================
// MemoryType
// =============================================================================

/// Tier of a memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// A specific conversational event ("visitor said X").
    Episodic,
    /// A durable fact about the visitor, independent of a turn.
    Semantic,
    /// How the conversation progressed (stage changes, actions taken).
    Procedural,
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryType::Episodic => write!(f, "episodic"),
            MemoryType::Semantic => write!(f, "semantic"),
            MemoryType::Procedural => write!(f, "procedural"),
        }
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "episodic" => Ok(MemoryType::Episodic),
            "semantic" => Ok(MemoryType::Semantic),
            "procedural" => Ok(MemoryType::Procedural),
            _ => Err(format!("Unknown memory type: {}", s)),
        }
    }
}

// =============================================================================
// MemoryEntry
// =============================================================================

/// One stored memory.
///
/// `content`, `importance` and `timestamp` never change after creation;
/// only `last_accessed` and `access_count` move, through the store's touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: Uuid,
    pub session_id: SessionId,
    pub memory_type: MemoryType,
    pub content: String,
    pub context: HashMap<String, serde_json::Value>,
    pub importance: u8,
    pub timestamp: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u32,
    pub tags: BTreeSet<String>,
}

impl MemoryEntry {
    /// Recency on a 0..10 scale: `10 / (1 + age_hours)`.
    ///
    /// Entries stamped in the future count as brand new.
    pub fn recency(&self, now: DateTime<Utc>) -> f64 {
        let age_secs = now
            .signed_duration_since(self.timestamp)
            .num_seconds()
            .max(0) as f64;
        10.0 / (1.0 + age_secs / 3600.0)
    }

    /// Retrieval score: `importance * 0.7 + recency * 0.3`.
    pub fn relevance(&self, now: DateTime<Utc>) -> f64 {
        f64::from(self.importance) * IMPORTANCE_WEIGHT + self.recency(now) * RECENCY_WEIGHT
    }

    /// Case-insensitive substring of the content, or exact tag.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.content.to_lowercase().contains(&q) || self.tags.contains(&q)
    }
}

/// Input for [`crate::MemoryManager::store`].
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub memory_type: MemoryType,
    pub content: String,
    pub context: HashMap<String, serde_json::Value>,
    pub importance: u8,
    pub tags: BTreeSet<String>,
}

impl NewMemory {
    pub fn new(memory_type: MemoryType, content: impl Into<String>) -> Self {
        Self {
            memory_type,
            content: content.into(),
            context: HashMap::new(),
            importance: 5,
            tags: BTreeSet::new(),
        }
    }

    pub fn episodic(content: impl Into<String>) -> Self {
        Self::new(MemoryType::Episodic, content)
    }

    pub fn semantic(content: impl Into<String>) -> Self {
        Self::new(MemoryType::Semantic, content)
    }

    pub fn procedural(content: impl Into<String>) -> Self {
        Self::new(MemoryType::Procedural, content)
    }

    pub fn importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into().to_lowercase());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|t| t.into().to_lowercase()));
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

// =============================================================================
// ConversationSummary
// =============================================================================

/// Rough technical fluency inferred from the technologies a visitor names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for TechnicalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TechnicalLevel::Beginner => write!(f, "beginner"),
            TechnicalLevel::Intermediate => write!(f, "intermediate"),
            TechnicalLevel::Advanced => write!(f, "advanced"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Technology, service and project values in first-seen order.
    pub interests: Vec<String>,
    pub technical_level: TechnicalLevel,
    /// Running qualification score. Only ever increases.
    pub lead_score: u32,
    pub project_type: Option<String>,
}

/// Rolling per-session aggregate maintained by the memory manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub session_id: SessionId,
    pub user_profile: UserProfile,
    /// Every tag seen in the session, in first-seen order.
    pub key_topics: Vec<String>,
    pub sentiment: Sentiment,
    pub next_actions: Vec<String>,
    pub last_interaction: DateTime<Utc>,
}

impl ConversationSummary {
    pub fn new(session_id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            user_profile: UserProfile::default(),
            key_topics: Vec::new(),
            sentiment: Sentiment::Neutral,
            next_actions: Vec::new(),
            last_interaction: now,
        }
    }

    /// Most recently added topic, if any.
    pub fn latest_topic(&self) -> Option<&str> {
        self.key_topics.last().map(|s| s.as_str())
    }

    /// Latest interest of the given tag kind (`technology`, `service`, ...).
    pub fn latest_topic_of(&self, kind: &str) -> Option<&str> {
        let prefix = format!("{}:", kind);
        self.key_topics
            .iter()
            .rev()
            .find_map(|t| t.strip_prefix(&prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn entry(importance: u8, timestamp: DateTime<Utc>) -> MemoryEntry {
        MemoryEntry {
            id: Uuid::new_v4(),
            session_id: SessionId::from("s"),
            memory_type: MemoryType::Episodic,
            content: "Visitor asked about React".to_string(),
            context: HashMap::new(),
            importance,
            timestamp,
            last_accessed: timestamp,
            access_count: 0,
            tags: ["technology:react".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn test_memory_type_display_from_str() {
        for t in [
            MemoryType::Episodic,
            MemoryType::Semantic,
            MemoryType::Procedural,
        ] {
            assert_eq!(MemoryType::from_str(&t.to_string()).unwrap(), t);
        }
        assert!(MemoryType::from_str("dream").is_err());
    }

    #[test]
    fn test_recency_scale() {
        let now = Utc::now();
        assert!((entry(5, now).recency(now) - 10.0).abs() < 1e-9);
        assert!((entry(5, now - Duration::hours(1)).recency(now) - 5.0).abs() < 1e-9);
        assert!((entry(5, now - Duration::hours(9)).recency(now) - 1.0).abs() < 1e-9);
        // Future timestamps are treated as age zero.
        assert!((entry(5, now + Duration::hours(2)).recency(now) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_combines_importance_and_recency() {
        let now = Utc::now();
        let fresh = entry(10, now);
        assert!((fresh.relevance(now) - 10.0).abs() < 1e-9);
        let old = entry(10, now - Duration::hours(9));
        assert!((old.relevance(now) - 7.3).abs() < 1e-9);
    }

    #[test]
    fn test_matches_query_content_and_tag() {
        let e = entry(5, Utc::now());
        assert!(e.matches_query("react"));
        assert!(e.matches_query("ASKED"));
        assert!(e.matches_query("technology:react"));
        assert!(!e.matches_query("vue"));
    }

    #[test]
    fn test_new_memory_builder_lowercases_tags() {
        let m = NewMemory::semantic("budget $5k")
            .importance(8)
            .tag("Budget:$5K")
            .tags(["Timeline:Next Week"])
            .context("source", serde_json::json!("nlu"));
        assert_eq!(m.memory_type, MemoryType::Semantic);
        assert_eq!(m.importance, 8);
        assert!(m.tags.contains("budget:$5k"));
        assert!(m.tags.contains("timeline:next week"));
        assert_eq!(m.context["source"], "nlu");
    }

    #[test]
    fn test_summary_latest_topic_of() {
        let mut s = ConversationSummary::new(SessionId::from("s"), Utc::now());
        s.key_topics = vec![
            "technology:react".into(),
            "project:website".into(),
            "technology:vue".into(),
        ];
        assert_eq!(s.latest_topic(), Some("technology:vue"));
        assert_eq!(s.latest_topic_of("technology"), Some("vue"));
        assert_eq!(s.latest_topic_of("project"), Some("website"));
        assert_eq!(s.latest_topic_of("budget"), None);
    }
}
