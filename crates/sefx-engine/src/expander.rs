//! Expansion of seed side-effect keywords into weighted related terms.

use std::collections::{BTreeSet, HashSet};

use crate::embeddings::EmbeddingProvider;
use crate::error::EngineError;
use crate::similarity::cosine_similarity;
use crate::synonyms::SynonymSource;
use crate::types::{ExpansionEntry, KeywordExpansion};

/// Filler words of multi-word side-effect names ("pain in extremity", "drug
/// ineffective") that are never looked up in the synonym source.
pub const STOP_WORDS: &[&str] = &[
    "pain",
    "hurt",
    "prescribed",
    "overdose",
    "condition",
    "no",
    "adverse",
    "event",
    "intentional",
    "to",
    "in",
    "site",
    "decreased",
    "increased",
    "drug",
];

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;
pub const DEFAULT_EXPANSION_TOP_K: usize = 10;

/// Expands seed keywords using a synonym source, an official term vocabulary,
/// and embedding similarity to the seed.
pub struct KeywordExpander<'a> {
    embedder: &'a dyn EmbeddingProvider,
    synonyms: &'a dyn SynonymSource,
    official_terms: &'a [String],
    threshold: f32,
    top_k: usize,
}

impl<'a> KeywordExpander<'a> {
    #[must_use]
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        synonyms: &'a dyn SynonymSource,
        official_terms: &'a [String],
    ) -> Self {
        Self {
            embedder,
            synonyms,
            official_terms,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            top_k: DEFAULT_EXPANSION_TOP_K,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Candidate terms for `seed`: synonyms of its non-stop-word tokens (and
    /// of the whole phrase), the official vocabulary, and the seed itself.
    #[must_use]
    pub fn reference_pool(&self, seed: &str) -> BTreeSet<String> {
        let mut tokens: Vec<&str> = seed.split_whitespace().collect();
        tokens.push(seed);

        let mut pool = BTreeSet::new();
        for token in tokens
            .into_iter()
            .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        {
            pool.extend(self.synonyms.synonyms(token));
        }
        pool.extend(self.official_terms.iter().cloned());
        pool.insert(seed.to_string());
        pool
    }

    /// Expand one seed keyword.
    ///
    /// Every pool term is embedded and compared to the seed; terms at or above
    /// the threshold are kept, best first, at most `top_k` of them. The seed
    /// itself carries weight exactly 1.0 unless its embedding is degenerate.
    ///
    /// # Errors
    ///
    /// Propagates embedding provider failures.
    pub async fn expand_keyword(&self, seed: &str) -> Result<KeywordExpansion, EngineError> {
        let pool = self.reference_pool(seed);

        let mut texts: Vec<&str> = Vec::with_capacity(pool.len() + 1);
        texts.push(seed);
        texts.extend(pool.iter().map(String::as_str));

        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(EngineError::Embedding(format!(
                "provider returned {} embeddings for {} expansion candidates",
                vectors.len(),
                texts.len()
            )));
        }
        let (seed_vec, term_vecs) = vectors.split_first().ok_or_else(|| {
            EngineError::Embedding("provider returned no embedding for the seed".to_string())
        })?;
        let seed_is_degenerate = cosine_similarity(seed_vec, seed_vec) == 0.0;

        let mut entries: Vec<ExpansionEntry> = pool
            .iter()
            .zip(term_vecs)
            .map(|(term, term_vec)| {
                let weight = if term == seed {
                    if seed_is_degenerate {
                        0.0
                    } else {
                        1.0
                    }
                } else {
                    cosine_similarity(seed_vec, term_vec)
                };
                ExpansionEntry {
                    term: term.clone(),
                    weight,
                }
            })
            .filter(|entry| entry.weight >= self.threshold)
            .collect();

        entries.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| a.term.cmp(&b.term))
        });
        entries.truncate(self.top_k);

        if entries.is_empty() {
            tracing::warn!(
                keyword = seed,
                candidates = pool.len(),
                "no expansion term passed the similarity threshold; keyword will score 0"
            );
        } else {
            tracing::debug!(
                keyword = seed,
                candidates = pool.len(),
                kept = entries.len(),
                "expanded keyword"
            );
        }

        Ok(KeywordExpansion {
            seed: seed.to_string(),
            entries,
        })
    }

    /// Expand every seed keyword, in input order, skipping repeated seeds.
    ///
    /// # Errors
    ///
    /// Propagates embedding provider failures.
    pub async fn expand(&self, seeds: &[String]) -> Result<Vec<KeywordExpansion>, EngineError> {
        let mut seen = HashSet::new();
        let mut expansions = Vec::with_capacity(seeds.len());
        for seed in seeds {
            if !seen.insert(seed.as_str()) {
                continue;
            }
            expansions.push(self.expand_keyword(seed).await?);
        }
        Ok(expansions)
    }
}

#[cfg(test)]
#[path = "expander_test.rs"]
mod tests;
