//! Keyword fallback engine.
//!
//! Answers from a short list of topics without touching stage or score.
//! Used when the qualification engine cannot produce a reply.

use async_trait::async_trait;

use crate::engine::ConversationEngine;
use crate::error::EngineError;
use crate::response::quick_replies;
use crate::scoring::is_qualified;
use crate::types::{EngineOrigin, EngineResponse, TurnContext};

const RULES: &[(&[&str], &str)] = &[
    (
        &["price", "pricing", "cost", "budget", "quote", "how much"],
        "Our websites start at $5,000 and custom applications usually range from $20,000 to $80,000. Want a quote for your project?",
    ),
    (
        &["how long", "timeline", "deadline", "weeks", "months"],
        "Most websites launch in four to eight weeks; larger applications take three to six months. When are you hoping to launch?",
    ),
    (
        &["book", "call", "meeting", "schedule", "consultation"],
        "I'd be happy to set up a free consultation with our team. What time works best for you?",
    ),
    (
        &["service", "offer", "what do you do", "help with"],
        "We design and build websites, web apps, mobile apps and online stores, plus branding and SEO. What are you working on?",
    ),
    (
        &["hello", "hi ", "hey"],
        "Hi there! What kind of project can we help you with?",
    ),
];

const DEFAULT_REPLY: &str =
    "I'm here to help with websites, apps and online stores. What would you like to build?";

#[derive(Debug, Default)]
pub struct RuleBasedEngine;

impl RuleBasedEngine {
    pub fn new() -> Self {
        Self
    }

    /// Reply for the first rule whose keyword occurs in the text.
    pub fn reply_for(text: &str) -> &'static str {
        let lower = format!("{} ", text.to_lowercase());
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map_or(DEFAULT_REPLY, |(_, reply)| *reply)
    }
}

#[async_trait]
impl ConversationEngine for RuleBasedEngine {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    async fn respond(&self, ctx: &TurnContext) -> Result<EngineResponse, EngineError> {
        Ok(EngineResponse {
            message: Self::reply_for(&ctx.utterance).to_string(),
            quick_replies: quick_replies(ctx.stage),
            next_stage: ctx.stage,
            score_delta: 0,
            flags: ctx.flags,
            should_notify: is_qualified(ctx.score, ctx.qualification_threshold),
            origin: EngineOrigin::RuleBased,
            confidence: 0.5,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::context;
    use codex_core::Stage;

    #[test]
    fn test_reply_for_keywords() {
        assert!(RuleBasedEngine::reply_for("How much does it COST?").contains("$5,000"));
        assert!(RuleBasedEngine::reply_for("what's your timeline").contains("weeks"));
        assert!(RuleBasedEngine::reply_for("hi").starts_with("Hi there"));
        assert_eq!(RuleBasedEngine::reply_for("qwerty"), DEFAULT_REPLY);
    }

    #[test]
    fn test_greeting_keyword_needs_word_end() {
        assert_eq!(RuleBasedEngine::reply_for("this is it"), DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn test_keeps_stage_and_score() {
        let ctx = context("Tell me about pricing", Stage::Qualification, 55);
        let response = RuleBasedEngine::new().respond(&ctx).await.unwrap();
        assert_eq!(response.next_stage, Stage::Qualification);
        assert_eq!(response.score_delta, 0);
        assert!(response.should_notify);
        assert_eq!(response.origin, EngineOrigin::RuleBased);
    }
}
