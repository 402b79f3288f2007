//! Folding memory entries into the rolling conversation summary.

use chrono::{DateTime, Utc};

use codex_core::Sentiment;

use crate::types::{ConversationSummary, MemoryEntry, MemoryType, TechnicalLevel};

/// Lead-score bonus for an episodic memory above [`BONUS_IMPORTANCE_THRESHOLD`].
pub const HIGH_IMPORTANCE_BONUS: u32 = 5;
pub const BONUS_IMPORTANCE_THRESHOLD: u8 = 7;

/// Tag kinds that count as visitor interests.
const INTEREST_KINDS: [&str; 3] = ["technology", "service", "project"];

/// Apply one freshly stored entry to the summary.
pub fn fold_entry(summary: &mut ConversationSummary, entry: &MemoryEntry, now: DateTime<Utc>) {
    for tag in &entry.tags {
        push_unique(&mut summary.key_topics, tag);

        if let Some((kind, value)) = tag.split_once(':') {
            if INTEREST_KINDS.contains(&kind) {
                push_unique(&mut summary.user_profile.interests, value);
            }
            if kind == "project" || kind == "service" {
                summary.user_profile.project_type = Some(value.to_string());
            }
        }
    }

    if entry.memory_type == MemoryType::Episodic
        && entry.importance > BONUS_IMPORTANCE_THRESHOLD
    {
        summary.user_profile.lead_score = summary
            .user_profile
            .lead_score
            .saturating_add(HIGH_IMPORTANCE_BONUS);
    }

    match codex_nlu::sentiment::sentiment(&entry.content) {
        Sentiment::Neutral => {}
        s => summary.sentiment = s,
    }

    summary.user_profile.technical_level = technical_level(summary);
    summary.last_interaction = now;
}

/// Derived from the number of distinct technologies in the key topics.
pub fn technical_level(summary: &ConversationSummary) -> TechnicalLevel {
    let technologies = summary
        .key_topics
        .iter()
        .filter(|t| t.starts_with("technology:"))
        .count();
    match technologies {
        0 | 1 => TechnicalLevel::Beginner,
        2 | 3 => TechnicalLevel::Intermediate,
        _ => TechnicalLevel::Advanced,
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
