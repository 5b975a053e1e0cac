use serde::Serialize;

use sefx_core::{CommentRecord, EngineConfig};

/// A term related to a seed keyword, weighted by its embedding similarity to
/// the seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionEntry {
    pub term: String,
    pub weight: f32,
}

/// The ranked expansion of one seed keyword.
///
/// Entries are unique by term and sorted by weight, descending. An empty
/// list means nothing passed the similarity threshold; the keyword then
/// scores 0 everywhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordExpansion {
    pub seed: String,
    pub entries: Vec<ExpansionEntry>,
}

/// A comment offered as support for a (drug, side effect) score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceItem {
    pub drug: String,
    pub side_effect: String,
    pub comment: String,
    pub score: f64,
}

/// Aggregate relevance of one seed keyword to one drug's comments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordScore {
    pub keyword: String,
    pub score: f64,
}

/// Scores and evidence for one drug, in seed keyword order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugReport {
    pub drug: String,
    pub comment_count: usize,
    pub scores: Vec<KeywordScore>,
    pub evidence: Vec<EvidenceItem>,
}

impl DrugReport {
    /// Aggregate score for `keyword`, if it was scored.
    #[must_use]
    pub fn score(&self, keyword: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.keyword == keyword)
            .map(|s| s.score)
    }
}

/// Everything a corpus run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusReport {
    /// Input records with their `side_effects` annotations, in input order.
    pub comments: Vec<CommentRecord>,
    /// One report per drug, in first-seen drug order.
    pub drugs: Vec<DrugReport>,
}

impl CorpusReport {
    /// All evidence items, drug by drug, keyword by keyword.
    pub fn evidence(&self) -> impl Iterator<Item = &EvidenceItem> {
        self.drugs.iter().flat_map(|d| d.evidence.iter())
    }
}

/// Tunables of the scoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSettings {
    pub similarity_threshold: f32,
    pub expansion_top_k: usize,
    pub evidence_top_k: usize,
    pub match_percentile: f64,
    pub max_concurrent_drugs: usize,
}

impl ScoringSettings {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            expansion_top_k: config.expansion_top_k,
            evidence_top_k: config.evidence_top_k,
            match_percentile: config.match_percentile,
            max_concurrent_drugs: config.max_concurrent_drugs.max(1),
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
