//! Conversation engines and the first-success pipeline that runs them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::EngineError;
use crate::response::quick_replies;
use crate::scoring::is_qualified;
use crate::types::{EngineOrigin, EngineResponse, TurnContext};

/// Reply used when every engine failed.
pub const LAST_RESORT_MESSAGE: &str =
    "Thanks for your message! Could you tell me a bit more about what you're looking for?";

/// Something that can turn an analyzed utterance into a reply.
#[async_trait]
pub trait ConversationEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn respond(&self, ctx: &TurnContext) -> Result<EngineResponse, EngineError>;
}

/// Engines tried in order; the first `Ok` wins.
pub struct EnginePipeline {
    engines: Vec<Arc<dyn ConversationEngine>>,
}

impl EnginePipeline {
    pub fn new(engines: Vec<Arc<dyn ConversationEngine>>) -> Self {
        Self { engines }
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub async fn run(&self, ctx: &TurnContext) -> EngineResponse {
        for engine in &self.engines {
            match engine.respond(ctx).await {
                Ok(response) => return response,
                Err(e) => warn!(
                    engine = engine.name(),
                    session = %ctx.session_id,
                    error = %e,
                    "Engine failed, trying next"
                ),
            }
        }
        warn!(session = %ctx.session_id, "All engines failed, using last-resort reply");
        last_resort(ctx)
    }
}

/// Keeps the stage and score as they are.
pub fn last_resort(ctx: &TurnContext) -> EngineResponse {
    EngineResponse {
        message: LAST_RESORT_MESSAGE.to_string(),
        quick_replies: quick_replies(ctx.stage),
        next_stage: ctx.stage,
        score_delta: 0,
        flags: ctx.flags,
        should_notify: is_qualified(ctx.score, ctx.qualification_threshold),
        origin: EngineOrigin::LastResort,
        confidence: 0.0,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use codex_core::{SessionId, Stage};
    use codex_nlu::Analyzer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::scoring::ScoreFlags;
    use crate::types::KnownFacts;

    pub(crate) fn context(text: &str, stage: Stage, score: u32) -> TurnContext {
        TurnContext {
            session_id: SessionId::from("engine-test"),
            utterance: text.to_string(),
            analysis: Analyzer::new().analyze(text),
            stage,
            score,
            flags: ScoreFlags::default(),
            summary: None,
            documents: Vec::new(),
            recalled: Vec::new(),
            known: KnownFacts::default(),
            qualification_threshold: 50,
        }
    }

    struct Failing {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConversationEngine for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn respond(&self, _ctx: &TurnContext) -> Result<EngineResponse, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::Unavailable("down".to_string()))
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl ConversationEngine for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn respond(&self, ctx: &TurnContext) -> Result<EngineResponse, EngineError> {
            Ok(EngineResponse {
                message: self.0.to_string(),
                quick_replies: vec!["ok".to_string()],
                next_stage: ctx.stage,
                score_delta: 0,
                flags: ctx.flags,
                should_notify: false,
                origin: EngineOrigin::RuleBased,
                confidence: 1.0,
            })
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let failing = Arc::new(Failing {
            calls: AtomicUsize::new(0),
        });
        let pipeline = EnginePipeline::new(vec![
            failing.clone() as Arc<dyn ConversationEngine>,
            Arc::new(Fixed("second")),
            Arc::new(Fixed("third")),
        ]);
        let response = pipeline.run(&context("hello", Stage::Greeting, 0)).await;
        assert_eq!(response.message, "second");
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failing_yields_last_resort() {
        let pipeline = EnginePipeline::new(vec![Arc::new(Failing {
            calls: AtomicUsize::new(0),
        })]);
        let response = pipeline
            .run(&context("what?", Stage::Analysis, 60))
            .await;
        assert_eq!(response.origin, EngineOrigin::LastResort);
        assert_eq!(response.message, LAST_RESORT_MESSAGE);
        assert_eq!(response.next_stage, Stage::Analysis);
        assert!(response.should_notify);
        assert!(!response.quick_replies.is_empty());
    }

    #[tokio::test]
    async fn test_empty_pipeline_is_last_resort() {
        let pipeline = EnginePipeline::new(Vec::new());
        assert!(pipeline.is_empty());
        let response = pipeline.run(&context("hi", Stage::Greeting, 0)).await;
        assert_eq!(response.origin, EngineOrigin::LastResort);
        assert!(!response.should_notify);
    }
}
