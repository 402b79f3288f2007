//! Qualification funnel transitions.
//!
//! A candidate stage is computed from the utterance's intent and entities,
//! then clamped so a session only ever moves forward or stays put.

use codex_core::{Entity, Intent, IntentType, Stage};

use crate::error::ChatError;

/// Qualifying intents above this confidence jump straight to conversion.
pub const CONVERSION_CONFIDENCE: f32 = 0.9;
/// Qualifying intents above this confidence reach proposal.
pub const PROPOSAL_CONFIDENCE: f32 = 0.8;
/// Qualifying intents above this confidence reach analysis.
pub const ANALYSIS_CONFIDENCE: f32 = 0.6;

/// Stage the rules point to, before clamping.
pub fn candidate_stage(current: Stage, intent: &Intent, entities: &[Entity]) -> Stage {
    if current == Stage::Conversion && intent.kind == IntentType::Booking {
        return Stage::Complete;
    }
    if intent.kind.is_qualifying() {
        if intent.confidence > CONVERSION_CONFIDENCE {
            return Stage::Conversion;
        }
        if intent.confidence > PROPOSAL_CONFIDENCE {
            return Stage::Proposal;
        }
        if intent.confidence > ANALYSIS_CONFIDENCE {
            return Stage::Analysis;
        }
    }

    match current {
        Stage::Greeting if intent.kind != IntentType::Greeting => Stage::Discovery,
        Stage::Discovery if entities.iter().any(|e| e.kind.is_qualifying()) => {
            Stage::Qualification
        }
        other => other,
    }
}

/// Next stage for a session: the candidate clamped to forward-or-stay.
/// A completed session never moves.
pub fn next_stage(current: Stage, intent: &Intent, entities: &[Entity]) -> Stage {
    if current.is_terminal() {
        return current;
    }
    current.max(candidate_stage(current, intent, entities))
}

/// Reject backward moves. `Complete` is the last stage, so nothing leaves it.
pub fn validate_transition(from: Stage, to: Stage) -> Result<(), ChatError> {
    if to < from {
        return Err(ChatError::InvalidTransition { from, to });
    }
    Ok(())
}

/// Follow-up work a human should do for a session at this stage.
pub fn next_actions(stage: Stage) -> Vec<String> {
    let actions: &[&str] = match stage {
        Stage::Greeting => &["Introduce services"],
        Stage::Discovery => &["Identify project type", "Ask about goals"],
        Stage::Qualification => &["Confirm budget", "Confirm timeline"],
        Stage::Analysis => &["Review requirements", "Prepare rough estimate"],
        Stage::Proposal => &["Send proposal", "Collect contact details"],
        Stage::Conversion => &["Schedule discovery call"],
        Stage::Complete => &["Hand over to project lead"],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use codex_core::{EntityType, Sentiment, Urgency};

    fn intent(kind: IntentType, confidence: f32) -> Intent {
        Intent {
            kind,
            confidence,
            sentiment: Sentiment::Neutral,
            urgency: Urgency::Medium,
            timestamp: Utc::now(),
        }
    }

    fn entity(kind: EntityType, value: &str) -> Entity {
        Entity {
            kind,
            value: value.to_string(),
            confidence: 0.8,
        }
    }

    #[test]
    fn test_greeting_stays_on_greeting() {
        let next = next_stage(Stage::Greeting, &intent(IntentType::Greeting, 0.8), &[]);
        assert_eq!(next, Stage::Greeting);
    }

    #[test]
    fn test_any_other_intent_leaves_greeting() {
        let next = next_stage(Stage::Greeting, &intent(IntentType::Question, 0.5), &[]);
        assert_eq!(next, Stage::Discovery);
    }

    #[test]
    fn test_confidence_thresholds_for_qualifying_intents() {
        let cases = [
            (0.95, Stage::Conversion),
            (0.85, Stage::Proposal),
            (0.7, Stage::Analysis),
        ];
        for (confidence, expected) in cases {
            let next = next_stage(Stage::Discovery, &intent(IntentType::Interest, confidence), &[]);
            assert_eq!(next, expected, "confidence {}", confidence);
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        let next = next_stage(Stage::Discovery, &intent(IntentType::Request, 0.8), &[]);
        assert_eq!(next, Stage::Analysis);
    }

    #[test]
    fn test_non_qualifying_intent_ignores_confidence() {
        let next = next_stage(Stage::Discovery, &intent(IntentType::Objection, 0.95), &[]);
        assert_eq!(next, Stage::Discovery);
    }

    #[test]
    fn test_discovery_advances_on_qualifying_entity() {
        let next = next_stage(
            Stage::Discovery,
            &intent(IntentType::Question, 0.5),
            &[entity(EntityType::Budget, "$5k")],
        );
        assert_eq!(next, Stage::Qualification);

        let next = next_stage(
            Stage::Discovery,
            &intent(IntentType::Question, 0.5),
            &[entity(EntityType::Technology, "react")],
        );
        assert_eq!(next, Stage::Discovery);
    }

    #[test]
    fn test_booking_in_conversion_completes() {
        for confidence in [0.8, 0.95] {
            let next = next_stage(
                Stage::Conversion,
                &intent(IntentType::Booking, confidence),
                &[],
            );
            assert_eq!(next, Stage::Complete);
        }
    }

    #[test]
    fn test_never_moves_backward() {
        let next = next_stage(Stage::Proposal, &intent(IntentType::Interest, 0.7), &[]);
        assert_eq!(next, Stage::Proposal);
        assert_eq!(
            candidate_stage(Stage::Proposal, &intent(IntentType::Interest, 0.7), &[]),
            Stage::Analysis
        );
    }

    #[test]
    fn test_complete_is_terminal() {
        let next = next_stage(Stage::Complete, &intent(IntentType::Booking, 0.95), &[]);
        assert_eq!(next, Stage::Complete);
    }

    #[test]
    fn test_validate_transition() {
        assert!(validate_transition(Stage::Discovery, Stage::Proposal).is_ok());
        assert!(validate_transition(Stage::Analysis, Stage::Analysis).is_ok());
        assert!(matches!(
            validate_transition(Stage::Proposal, Stage::Discovery),
            Err(ChatError::InvalidTransition {
                from: Stage::Proposal,
                to: Stage::Discovery
            })
        ));
    }

    #[test]
    fn test_next_actions_never_empty() {
        for stage in Stage::ALL {
            assert!(!next_actions(stage).is_empty(), "{}", stage);
        }
    }
}
