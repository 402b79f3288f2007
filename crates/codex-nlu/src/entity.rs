//! Entity extraction from visitor utterances.

use std::ops::Range;

use regex::Regex;

use codex_core::{Entity, EntityType};

/// Fixed confidence for every regex-extracted entity.
pub const ENTITY_CONFIDENCE: f32 = 0.8;

/// A compiled extraction rule. `group` selects the capture holding the value.
struct EntityRule {
    kind: EntityType,
    regex: Regex,
    group: usize,
}

/// Extracts typed spans (technologies, budgets, timelines, ...) from text.
pub struct EntityExtractor {
    rules: Vec<EntityRule>,
}

impl EntityExtractor {
    /// Create a new entity extractor with pre-compiled regex patterns.
    pub fn new() -> Self {
        let table: Vec<(EntityType, &str, usize)> = vec![
            // Technologies
            (
                EntityType::Technology,
                r"(?i)\b(?:react(?:\s+native)?|next\.?js|vue(?:\.js)?|angular|svelte|node(?:\.js)?|python|django|flask|rust|go(?:lang)|typescript|javascript|php|laravel|wordpress|shopify|webflow|flutter|swift|kotlin|aws|azure|gcp|docker|kubernetes|postgres(?:ql)?|mysql|mongodb|graphql|tailwind|firebase|stripe)\b",
                0,
            ),
            // Services
            (
                EntityType::Service,
                r"(?i)\b(?:web\s+development|web\s+design|app\s+development|mobile\s+development|ui/ux(?:\s+design)?|ux\s+design|ui\s+design|seo|branding|consulting|maintenance|hosting|digital\s+marketing|content\s+writing|copywriting)\b",
                0,
            ),
            // Projects
            (
                EntityType::Project,
                r"(?i)\b(?:website|web\s*site|web\s+app(?:lication)?|mobile\s+app|ios\s+app|android\s+app|online\s+store|e-?commerce(?:\s+(?:site|store|platform))?|landing\s+page|dashboard|saas|portal|portfolio|blog|crm|booking\s+system|marketplace)\b",
                0,
            ),
            // Budgets with a currency marker
            (
                EntityType::Budget,
                r"(?i)\$\s?\d[\d,]*(?:\.\d{1,2})?(?:\s?k)?\b",
                0,
            ),
            (
                EntityType::Budget,
                r"(?i)\b\d[\d,]*(?:\.\d{1,2})?\s?(?:k\s+)?(?:usd|dollars|eur|euros?|gbp|pounds)\b",
                0,
            ),
            (
                EntityType::Budget,
                r"(?i)\bbudget\s+(?:of\s+|is\s+|around\s+|about\s+)?(\d[\d,]*(?:\s?k)?)\b",
                1,
            ),
            // Timelines
            (
                EntityType::Timeline,
                r"(?i)\b(?:within|in)\s+(?:\d+|a|one|two|three|four|six|a\s+few)\s+(?:days?|weeks?|months?)\b",
                0,
            ),
            (
                EntityType::Timeline,
                r"(?i)\b(?:next|this)\s+(?:week|month|quarter|year)\b",
                0,
            ),
            (
                EntityType::Timeline,
                r"(?i)\bby\s+(?:january|february|march|april|may|june|july|august|september|october|november|december|(?:the\s+)?end\s+of\s+(?:the\s+)?(?:week|month|quarter|year))\b",
                0,
            ),
            (
                EntityType::Timeline,
                r"(?i)\b\d+\s*(?:-|to)\s*\d+\s+(?:weeks|months)\b",
                0,
            ),
            // People
            (
                EntityType::Person,
                r"(?:(?i:my\s+name\s+is|call\s+me)|I'm|I\s+am)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)",
                1,
            ),
            // Companies
            (
                EntityType::Company,
                r"\b[A-Z][A-Za-z0-9&]+(?:\s+[A-Z][A-Za-z0-9&]+)*\s+(?:Inc|LLC|Ltd|Corp|GmbH)\b",
                0,
            ),
            (
                EntityType::Company,
                r"(?i:i\s+work\s+(?:at|for)|our\s+company\s+is|company\s+called)\s+([A-Z][A-Za-z0-9&]+(?:\s+[A-Z][A-Za-z0-9&]+)*)",
                1,
            ),
        ];

        let rules = table
            .into_iter()
            .map(|(kind, pat, group)| EntityRule {
                kind,
                regex: Regex::new(pat).expect("Invalid entity regex"),
                group,
            })
            .collect();

        Self { rules }
    }

    /// Extract all recognized entities from the given text.
    ///
    /// Several entities of one kind may be returned; identical kind and
    /// value pairs (case-insensitive) are reported once, and a span already
    /// covered by an earlier match of the same kind is skipped.
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();
        let mut spans: Vec<(EntityType, Range<usize>)> = Vec::new();

        for rule in &self.rules {
            for caps in rule.regex.captures_iter(text) {
                let Some(m) = caps.get(rule.group) else {
                    continue;
                };
                let value = m.as_str().trim();
                if value.is_empty() {
                    continue;
                }
                if rule.kind == EntityType::Person && is_common_word(first_word(value)) {
                    continue;
                }
                let span = m.range();
                if spans
                    .iter()
                    .any(|(kind, s)| *kind == rule.kind && s.start < span.end && span.start < s.end)
                {
                    continue;
                }
                spans.push((rule.kind, span));
                let duplicate = entities
                    .iter()
                    .any(|e| e.kind == rule.kind && e.value.eq_ignore_ascii_case(value));
                if !duplicate {
                    entities.push(Entity {
                        kind: rule.kind,
                        value: value.to_string(),
                        confidence: ENTITY_CONFIDENCE,
                    });
                }
            }
        }

        entities
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn first_word(s: &str) -> &str {
    s.split_whitespace().next().unwrap_or(s)
}

/// Capitalized words that follow "I'm" without being a name.
fn is_common_word(s: &str) -> bool {
    matches!(
        s,
        "Interested"
            | "Looking"
            | "Not"
            | "Just"
            | "Really"
            | "Very"
            | "Sure"
            | "Ready"
            | "The"
            | "A"
            | "An"
            | "Here"
            | "Trying"
            | "Thinking"
            | "Planning"
            | "Building"
            | "Working"
    )
}
