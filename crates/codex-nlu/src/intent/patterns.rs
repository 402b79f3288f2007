//! Regex pattern groups for intent classification.
//!
//! Every intent kind owns one group. Each pattern carries a weight; the
//! classifier sums the weights of the matching patterns per kind, so the
//! order in which groups are declared here has no effect on the outcome.

use regex::Regex;

use codex_core::IntentType;

/// A single compiled regex pattern linked to an intent kind.
pub struct IntentPattern {
    pub regex: Regex,
    pub kind: IntentType,
    pub weight: f32,
}

/// One matching pattern for a given utterance.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub kind: IntentType,
    pub weight: f32,
    pub matched_text: String,
}

/// Tie-break rank between intent kinds with equal total weight.
///
/// Higher wins. Commercial signals outrank conversational ones so an
/// utterance that is both a greeting and a booking request is treated as
/// a booking.
pub fn priority(kind: IntentType) -> u8 {
    match kind {
        IntentType::Booking => 7,
        IntentType::Interest => 6,
        IntentType::Objection => 5,
        IntentType::Request => 4,
        IntentType::Goodbye => 3,
        IntentType::Greeting => 2,
        IntentType::Question => 1,
    }
}

/// Collection of all intent patterns, compiled once and reused.
pub struct PatternSet {
    patterns: Vec<IntentPattern>,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternSet {
    /// Create a new PatternSet with all compiled patterns.
    pub fn new() -> Self {
        let mut patterns = Vec::new();

        // =====================================================================
        // Greeting patterns
        // =====================================================================
        let greeting_patterns: Vec<(&str, f32)> = vec![
            (r"(?i)^\s*(?:hi|hello|hey|hiya|howdy|greetings)\b", 1.0),
            (r"(?i)\bgood\s+(?:morning|afternoon|evening)\b", 1.0),
            (r"(?i)^\s*(?:yo|sup)\b", 0.6),
            (r"(?i)\bnice\s+to\s+meet\s+you\b", 0.8),
        ];
        push_group(&mut patterns, IntentType::Greeting, &greeting_patterns);

        // =====================================================================
        // Question patterns
        // =====================================================================
        let question_patterns: Vec<(&str, f32)> = vec![
            (r"\?\s*$", 0.8),
            (
                r"(?i)^\s*(?:what|how|why|when|where|who|which)\b",
                0.9,
            ),
            (
                r"(?i)^\s*(?:can|could|do|does|is|are|will|would)\s+(?:you|your|it|this|there)\b",
                0.7,
            ),
            (r"(?i)\btell\s+me\s+about\b", 0.7),
            (r"(?i)\bexplain\b", 0.6),
        ];
        push_group(&mut patterns, IntentType::Question, &question_patterns);

        // =====================================================================
        // Request patterns
        // =====================================================================
        let request_patterns: Vec<(&str, f32)> = vec![
            (
                r"(?i)\b(?:i|we)\s+(?:need|want|require)\b",
                1.0,
            ),
            (r"(?i)\b(?:i|we)(?:'d|\s+would)\s+like\b", 1.0),
            (
                r"(?i)\b(?:build|create|develop|design|make|redesign)\s+(?:a|an|my|our|the)\b",
                1.0,
            ),
            (r"(?i)\blooking\s+for\b", 0.9),
            (r"(?i)\bhelp\s+(?:me|us)\s+(?:with|build|create)\b", 0.9),
            (r"(?i)\bcan\s+you\s+(?:build|make|create|help)\b", 0.8),
        ];
        push_group(&mut patterns, IntentType::Request, &request_patterns);

        // =====================================================================
        // Objection patterns
        // =====================================================================
        let objection_patterns: Vec<(&str, f32)> = vec![
            (r"(?i)\btoo\s+(?:expensive|pricey|costly|much|slow|long)\b", 1.2),
            (r"(?i)\b(?:can'?t|cannot)\s+afford\b", 1.2),
            (r"(?i)\bnot\s+(?:sure|convinced|ready)\b", 1.0),
            (r"(?i)\b(?:concerned|worried)\s+(?:about|that)\b", 1.0),
            (r"(?i)\bcheaper\b", 0.9),
            (r"(?i)\bthink\s+about\s+it\b", 0.8),
            (r"(?i)\bother\s+(?:agencies|options|quotes)\b", 0.8),
        ];
        push_group(&mut patterns, IntentType::Objection, &objection_patterns);

        // =====================================================================
        // Interest patterns
        // =====================================================================
        let interest_patterns: Vec<(&str, f32)> = vec![
            (r"(?i)\binterested\b", 1.2),
            (r"(?i)\bsounds\s+(?:good|great|perfect|interesting|amazing)\b", 1.0),
            (r"(?i)\b(?:love|like)\s+(?:that|this|it|your)\b", 0.9),
            (r"(?i)\btell\s+me\s+more\b", 1.0),
            (r"(?i)\b(?:pricing|quote|estimate|proposal)\b", 1.0),
            (r"(?i)\bhow\s+much\b", 0.9),
            (r"(?i)\bexactly\s+what\s+(?:i|we)\s+need\b", 1.1),
        ];
        push_group(&mut patterns, IntentType::Interest, &interest_patterns);

        // =====================================================================
        // Booking patterns
        // =====================================================================
        let booking_patterns: Vec<(&str, f32)> = vec![
            (r"(?i)\b(?:book|schedule|arrange)\b", 1.2),
            (r"(?i)\b(?:call|meeting|consultation|demo|appointment)\b", 1.0),
            (r"(?i)\b(?:get|getting)\s+started\b", 1.1),
            (r"(?i)\bsign\s+(?:me\s+|us\s+)?up\b", 1.1),
            (r"(?i)\bhire\s+(?:you|your\s+team)\b", 1.2),
            (r"(?i)\blet'?s\s+(?:do\s+it|go|proceed)\b", 1.0),
        ];
        push_group(&mut patterns, IntentType::Booking, &booking_patterns);

        // =====================================================================
        // Goodbye patterns
        // =====================================================================
        let goodbye_patterns: Vec<(&str, f32)> = vec![
            (r"(?i)\b(?:bye|goodbye|farewell|cya)\b", 1.2),
            (r"(?i)\bsee\s+you\b", 1.0),
            (r"(?i)\btalk\s+(?:to\s+you\s+)?(?:later|soon)\b", 1.0),
            (r"(?i)\bhave\s+a\s+(?:good|nice|great)\s+(?:day|one|evening)\b", 1.0),
            (r"(?i)\bthat'?s\s+all\b", 0.7),
        ];
        push_group(&mut patterns, IntentType::Goodbye, &goodbye_patterns);

        Self { patterns }
    }

    /// Every pattern matching the given text, in declaration order.
    pub fn detect(&self, text: &str) -> Vec<PatternMatch> {
        self.patterns
            .iter()
            .filter_map(|pattern| {
                pattern.regex.find(text).map(|m| PatternMatch {
                    kind: pattern.kind,
                    weight: pattern.weight,
                    matched_text: m.as_str().to_string(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn push_group(patterns: &mut Vec<IntentPattern>, kind: IntentType, group: &[(&str, f32)]) {
    for (pat, weight) in group {
        patterns.push(IntentPattern {
            regex: Regex::new(pat).expect("Invalid intent regex"),
            kind,
            weight: *weight,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ps() -> PatternSet {
        PatternSet::new()
    }

    fn kinds(text: &str) -> Vec<IntentType> {
        ps().detect(text).into_iter().map(|m| m.kind).collect()
    }

    #[test]
    fn test_every_kind_has_patterns() {
        let set = ps();
        for kind in IntentType::ALL {
            assert!(
                set.patterns.iter().any(|p| p.kind == kind),
                "no patterns for {}",
                kind
            );
        }
    }

    #[test]
    fn test_priority_is_total_order() {
        let mut ranks: Vec<u8> = IntentType::ALL.iter().map(|k| priority(*k)).collect();
        ranks.sort();
        ranks.dedup();
        assert_eq!(ranks.len(), IntentType::ALL.len());
        assert!(priority(IntentType::Booking) > priority(IntentType::Interest));
        assert!(priority(IntentType::Greeting) > priority(IntentType::Question));
    }

    #[test]
    fn test_greeting_does_not_match_inside_words() {
        assert!(kinds("Hi").contains(&IntentType::Greeting));
        assert!(!kinds("this is a thing").contains(&IntentType::Greeting));
    }

    #[test]
    fn test_booking_patterns() {
        let found = kinds("Can we schedule a call?");
        assert!(found.contains(&IntentType::Booking));
        assert!(found.iter().filter(|k| **k == IntentType::Booking).count() >= 2);
    }

    #[test]
    fn test_objection_patterns() {
        assert!(kinds("That is too expensive for us").contains(&IntentType::Objection));
        assert!(kinds("we can't afford that").contains(&IntentType::Objection));
    }

    #[test]
    fn test_goodbye_patterns() {
        assert!(kinds("Thanks, bye!").contains(&IntentType::Goodbye));
        assert!(kinds("talk to you later").contains(&IntentType::Goodbye));
    }

    #[test]
    fn test_matched_text_is_recorded() {
        let matches = ps().detect("I am interested");
        let m = matches
            .iter()
            .find(|m| m.kind == IntentType::Interest)
            .unwrap();
        assert_eq!(m.matched_text.to_lowercase(), "interested");
    }

    #[test]
    fn test_no_match_on_empty_text() {
        assert!(ps().detect("").is_empty());
    }
}
