//! Intent classification from a single utterance.
//!
//! All pattern groups are evaluated. The kind with the highest summed weight
//! wins; equal weights fall back to [`patterns::priority`].

pub mod patterns;

use std::collections::HashMap;

use serde::Serialize;

use codex_core::IntentType;

use patterns::{priority, PatternSet};

/// Confidence assigned when no pattern matches.
pub const BASE_CONFIDENCE: f32 = 0.5;
/// Confidence added per matching pattern of the winning kind.
pub const CONFIDENCE_STEP: f32 = 0.3;
/// Ceiling for classifier confidence.
pub const MAX_CONFIDENCE: f32 = 0.95;

/// Aggregated evidence for one intent kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentCandidate {
    pub kind: IntentType,
    pub hits: usize,
    pub weight: f32,
    pub confidence: f32,
}

/// Confidence for a given number of matching patterns.
pub fn confidence_for_hits(hits: usize) -> f32 {
    (BASE_CONFIDENCE + CONFIDENCE_STEP * hits as f32).min(MAX_CONFIDENCE)
}

/// Weighted pattern classifier.
pub struct IntentClassifier {
    patterns: PatternSet,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            patterns: PatternSet::new(),
        }
    }

    /// All kinds with at least one matching pattern, best first.
    ///
    /// Ordering: total weight descending, then declared priority descending.
    pub fn rank(&self, text: &str) -> Vec<IntentCandidate> {
        let mut totals: HashMap<IntentType, (usize, f32)> = HashMap::new();
        for m in self.patterns.detect(text) {
            let entry = totals.entry(m.kind).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += m.weight;
        }

        let mut candidates: Vec<IntentCandidate> = totals
            .into_iter()
            .map(|(kind, (hits, weight))| IntentCandidate {
                kind,
                hits,
                weight,
                confidence: confidence_for_hits(hits),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| priority(b.kind).cmp(&priority(a.kind)))
        });
        candidates
    }

    /// Winning kind and its confidence. Falls back to a question at base
    /// confidence when nothing matches.
    pub fn classify(&self, text: &str) -> (IntentType, f32) {
        self.rank(text)
            .into_iter()
            .next()
            .map(|c| (c.kind, c.confidence))
            .unwrap_or((IntentType::Question, BASE_CONFIDENCE))
    }
}
