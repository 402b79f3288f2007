//! Primary engine: funnel stage, lead score and a templated reply.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::engine::ConversationEngine;
use crate::error::EngineError;
use crate::response::{quick_replies, Placeholders, ResponseGenerator};
use crate::scoring::{is_qualified, score_turn};
use crate::stage::next_stage;
use crate::types::{EngineOrigin, EngineResponse, TurnContext};

pub struct QualificationEngine {
    generator: Arc<ResponseGenerator>,
}

impl QualificationEngine {
    pub fn new(generator: Arc<ResponseGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl ConversationEngine for QualificationEngine {
    fn name(&self) -> &'static str {
        "qualification"
    }

    async fn respond(&self, ctx: &TurnContext) -> Result<EngineResponse, EngineError> {
        let intent = &ctx.analysis.intent;
        let entities = &ctx.analysis.entities;

        let stage = next_stage(ctx.stage, intent, entities);
        let turn = score_turn(&ctx.analysis, ctx.flags);
        let score = ctx.score.saturating_add(turn.delta);

        let placeholders = Placeholders::resolve(
            entities,
            ctx.summary.as_ref(),
            &ctx.recalled,
            &ctx.known,
        );
        let message = self
            .generator
            .generate(stage, intent.kind, &placeholders, &ctx.documents)
            .ok_or(EngineError::NoTemplate(stage))?;

        debug!(
            session = %ctx.session_id,
            from = %ctx.stage,
            to = %stage,
            delta = turn.delta,
            score,
            "Qualification step"
        );

        Ok(EngineResponse {
            message,
            quick_replies: quick_replies(stage),
            next_stage: stage,
            score_delta: turn.delta,
            flags: turn.flags,
            should_notify: is_qualified(score, ctx.qualification_threshold),
            origin: EngineOrigin::Qualification,
            confidence: intent.confidence,
        })
    }
}
