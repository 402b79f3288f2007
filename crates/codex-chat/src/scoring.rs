//! Lead scoring per utterance.
//!
//! Interest, booking and positive sentiment score on every message. A
//! confirmed budget and decision authority score once per session; the
//! [`ScoreFlags`] carried on the session remember which already did.

use serde::{Deserialize, Serialize};

use codex_core::{EntityType, IntentType, Sentiment};
use codex_nlu::Analysis;

pub const INTEREST_POINTS: u32 = 10;
pub const BOOKING_POINTS: u32 = 20;
pub const POSITIVE_SENTIMENT_POINTS: u32 = 5;
pub const BUDGET_POINTS: u32 = 15;
pub const AUTHORITY_POINTS: u32 = 10;

/// Default score at which a lead is handed to the dispatcher.
pub const DEFAULT_QUALIFICATION_THRESHOLD: u32 = 50;

/// One-off signals already credited for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreFlags {
    pub budget_confirmed: bool,
    pub authority_confirmed: bool,
}

/// Points earned by one utterance and the flags after crediting them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnScore {
    pub delta: u32,
    pub flags: ScoreFlags,
}

pub fn score_turn(analysis: &Analysis, flags: ScoreFlags) -> TurnScore {
    let mut delta = match analysis.intent.kind {
        IntentType::Interest => INTEREST_POINTS,
        IntentType::Booking => BOOKING_POINTS,
        _ => 0,
    };
    if analysis.intent.sentiment == Sentiment::Positive {
        delta += POSITIVE_SENTIMENT_POINTS;
    }

    let mut flags = flags;
    let has_budget = analysis
        .entities
        .iter()
        .any(|e| e.kind == EntityType::Budget);
    if has_budget && !flags.budget_confirmed {
        delta += BUDGET_POINTS;
        flags.budget_confirmed = true;
    }
    if analysis.decision_authority && !flags.authority_confirmed {
        delta += AUTHORITY_POINTS;
        flags.authority_confirmed = true;
    }

    TurnScore { delta, flags }
}

pub fn is_qualified(score: u32, threshold: u32) -> bool {
    score >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_nlu::Analyzer;

    fn score(text: &str, flags: ScoreFlags) -> TurnScore {
        score_turn(&Analyzer::new().analyze(text), flags)
    }

    #[test]
    fn test_booking_scores_twenty() {
        let turn = score("Can we schedule a call?", ScoreFlags::default());
        assert_eq!(turn.delta, BOOKING_POINTS);
    }

    #[test]
    fn test_interest_with_positive_sentiment() {
        let turn = score("That sounds great, I'm interested", ScoreFlags::default());
        assert_eq!(turn.delta, INTEREST_POINTS + POSITIVE_SENTIMENT_POINTS);
    }

    #[test]
    fn test_budget_scores_once() {
        let first = score("Our budget is $15,000", ScoreFlags::default());
        assert!(first.flags.budget_confirmed);
        assert_eq!(first.delta, BUDGET_POINTS);

        let second = score("Our budget is $15,000", first.flags);
        assert_eq!(second.delta, 0);
        assert_eq!(second.flags, first.flags);
    }

    #[test]
    fn test_authority_scores_once() {
        let first = score("I'm the founder of the company", ScoreFlags::default());
        assert!(first.flags.authority_confirmed);
        assert_eq!(first.delta, AUTHORITY_POINTS);

        let second = score("I'm the founder of the company", first.flags);
        assert_eq!(second.delta, 0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(is_qualified(50, DEFAULT_QUALIFICATION_THRESHOLD));
        assert!(!is_qualified(49, DEFAULT_QUALIFICATION_THRESHOLD));
    }
}
