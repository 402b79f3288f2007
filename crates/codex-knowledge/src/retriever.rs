//! Keyword relevance search over the document corpus.
//!
//! Scoring per document:
//! - 3 points per keyword found in the query,
//! - 2 points when the content contains the query or a significant term,
//! - 1 point when the summary does.
//!
//! Ties rank documents with more keywords first, then by id.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use codex_core::KnowledgeConfig;

use crate::corpus::{builtin_documents, load_corpus};
use crate::document::{Category, Document, ScoredDocument};
use crate::error::KnowledgeError;

pub const KEYWORD_POINTS: u32 = 3;
pub const CONTENT_POINTS: u32 = 2;
pub const SUMMARY_POINTS: u32 = 1;

/// Query terms shorter than this never count on their own.
const MIN_TERM_LEN: usize = 4;

const STOP_WORDS: &[&str] = &[
    "about", "also", "been", "could", "does", "doing", "from", "have", "into", "just", "like",
    "make", "many", "more", "much", "need", "should", "some", "than", "that", "their", "them",
    "then", "there", "they", "this", "very", "want", "what", "when", "where", "which", "will",
    "with", "would", "your",
];

/// Anything that can answer a knowledge query.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Best matching documents, at most `limit`.
    async fn retrieve(
        &self,
        query: &str,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, KnowledgeError>;
}

/// Run a retrieval bounded by `timeout`.
pub async fn retrieve_with_timeout(
    retriever: &dyn KnowledgeRetriever,
    query: &str,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<ScoredDocument>, KnowledgeError> {
    match tokio::time::timeout(timeout, retriever.retrieve(query, None, limit)).await {
        Ok(result) => result,
        Err(_) => Err(KnowledgeError::Timeout(timeout.as_millis() as u64)),
    }
}

// =============================================================================
// KnowledgeBase
// =============================================================================

/// In-process corpus searched on every call.
pub struct KnowledgeBase {
    documents: Vec<Document>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnowledgeBase {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Knowledge base over the bundled documents.
    pub fn builtin() -> Self {
        Self::new(builtin_documents())
    }

    /// Load a TOML corpus, optionally on top of the bundled documents.
    ///
    /// File documents replace bundled ones with the same id.
    pub fn load(path: &Path, include_builtin: bool) -> Result<Self, KnowledgeError> {
        let loaded = load_corpus(path)?;
        let mut documents = if include_builtin {
            builtin_documents()
        } else {
            Vec::new()
        };
        documents.retain(|d| !loaded.iter().any(|l| l.id == d.id));
        documents.extend(loaded);
        Ok(Self::new(documents))
    }

    /// Build from configuration, falling back to the bundled corpus when
    /// the configured file cannot be loaded.
    pub fn from_config(config: &KnowledgeConfig) -> Self {
        match &config.corpus_path {
            Some(path) => match Self::load(Path::new(path), config.include_builtin) {
                Ok(kb) => kb,
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to load knowledge corpus, using built-in documents");
                    Self::builtin()
                }
            },
            None => Self::builtin(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// All documents with a positive score, best first.
    pub fn search(&self, query: &str, category: Option<Category>) -> Vec<ScoredDocument> {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return Vec::new();
        }
        let terms = significant_terms(&normalized);

        let mut hits: Vec<ScoredDocument> = self
            .documents
            .iter()
            .filter(|d| category.map_or(true, |c| d.category == c))
            .filter_map(|d| {
                let score = score_document(d, &normalized, &terms);
                (score > 0).then(|| ScoredDocument {
                    document: d.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.document.keywords.len().cmp(&a.document.keywords.len()))
                .then_with(|| a.document.id.cmp(&b.document.id))
        });

        debug!(query = %normalized, hits = hits.len(), "Knowledge search");
        hits
    }
}

#[async_trait]
impl KnowledgeRetriever for KnowledgeBase {
    async fn retrieve(
        &self,
        query: &str,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, KnowledgeError> {
        let mut hits = self.search(query, category);
        hits.truncate(limit);
        Ok(hits)
    }
}

// =============================================================================
// Scoring helpers
// =============================================================================

/// Lowercase, strip edge punctuation from each word, collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '$'))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn significant_terms(normalized: &str) -> Vec<&str> {
    normalized
        .split(' ')
        .filter(|t| t.chars().count() >= MIN_TERM_LEN && !STOP_WORDS.contains(t))
        .collect()
}

fn text_hit(haystack: &str, normalized_query: &str, terms: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    haystack.contains(normalized_query) || terms.iter().any(|t| haystack.contains(t))
}

fn score_document(doc: &Document, normalized_query: &str, terms: &[&str]) -> u32 {
    let padded = format!(" {} ", normalized_query);
    let keyword_hits = doc
        .keywords
        .iter()
        .filter(|k| padded.contains(&format!(" {} ", k.to_lowercase())))
        .count() as u32;

    let mut score = keyword_hits * KEYWORD_POINTS;
    if text_hit(&doc.content, normalized_query, terms) {
        score += CONTENT_POINTS;
    }
    if text_hit(&doc.summary, normalized_query, terms) {
        score += SUMMARY_POINTS;
    }
    score
}

/// The sentence used to enrich a reply: the first sentence of the best
/// document's summary.
pub fn contextual_sentence(docs: &[ScoredDocument]) -> Option<String> {
    let top = docs.first()?;
    let summary = top.document.summary.trim();
    if summary.is_empty() {
        return None;
    }
    let sentence = match summary.find(". ") {
        Some(idx) => &summary[..=idx],
        None => summary,
    };
    Some(sentence.to_string())
}
