//! Side-effect analysis orchestration.

use futures::stream::{self, StreamExt, TryStreamExt};

use sefx_core::CommentRecord;

use crate::annotations::{AnnotationStore, CommentId};
use crate::embeddings::EmbeddingProvider;
use crate::error::EngineError;
use crate::evidence::EvidenceSelector;
use crate::expander::KeywordExpander;
use crate::scorer::{aggregate_score, per_comment_scores};
use crate::similarity::build_similarity_matrix;
use crate::synonyms::SynonymSource;
use crate::types::{CorpusReport, DrugReport, KeywordExpansion, KeywordScore, ScoringSettings};

/// Scores seed keywords against drug review comments.
///
/// Holds the embedding provider and synonym source by reference; wrap the
/// provider in [`CachedEmbedder`](crate::CachedEmbedder) so repeated terms
/// and comments are embedded once per run.
pub struct Analyzer<'a> {
    embedder: &'a dyn EmbeddingProvider,
    synonyms: &'a dyn SynonymSource,
    official_terms: &'a [String],
    settings: ScoringSettings,
}

impl<'a> Analyzer<'a> {
    #[must_use]
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        synonyms: &'a dyn SynonymSource,
        official_terms: &'a [String],
        settings: ScoringSettings,
    ) -> Self {
        Self {
            embedder,
            synonyms,
            official_terms,
            settings,
        }
    }

    /// Expand every seed keyword once for the run.
    ///
    /// # Errors
    ///
    /// Propagates embedding provider failures.
    pub async fn expand_keywords(
        &self,
        seeds: &[String],
    ) -> Result<Vec<KeywordExpansion>, EngineError> {
        KeywordExpander::new(self.embedder, self.synonyms, self.official_terms)
            .with_threshold(self.settings.similarity_threshold)
            .with_top_k(self.settings.expansion_top_k)
            .expand(seeds)
            .await
    }

    fn selector(&self) -> EvidenceSelector {
        EvidenceSelector::new(self.settings.evidence_top_k)
            .with_percentile(self.settings.match_percentile)
    }

    /// Score every expansion against one drug's comments.
    ///
    /// Comments are embedded once; each keyword then gets a similarity
    /// matrix, an aggregate score, and evidence. Matching comments are
    /// annotated in `store`. A drug without comments, or a keyword with an
    /// empty expansion, scores 0 and yields no evidence or annotations.
    ///
    /// # Errors
    ///
    /// Propagates embedding provider failures and unknown comment ids.
    pub async fn analyze_drug(
        &self,
        drug: &str,
        comments: &[CommentId],
        expansions: &[KeywordExpansion],
        store: &AnnotationStore,
    ) -> Result<DrugReport, EngineError> {
        let texts = comments
            .iter()
            .map(|&id| store.cleaned_text(id).ok_or(EngineError::UnknownComment(id)))
            .collect::<Result<Vec<&str>, _>>()?;

        let comment_embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&texts).await?
        };
        if comment_embeddings.len() != texts.len() {
            return Err(EngineError::Embedding(format!(
                "provider returned {} embeddings for {} comments of {drug}",
                comment_embeddings.len(),
                texts.len()
            )));
        }

        let selector = self.selector();
        let mut scores = Vec::with_capacity(expansions.len());
        let mut evidence = Vec::new();

        for expansion in expansions {
            // Nothing passed the similarity threshold: score 0, no matches.
            if expansion.entries.is_empty() {
                tracing::debug!(drug, keyword = %expansion.seed, "keyword has no expansion");
                scores.push(KeywordScore {
                    keyword: expansion.seed.clone(),
                    score: 0.0,
                });
                continue;
            }

            let matrix =
                build_similarity_matrix(self.embedder, &expansion.entries, &comment_embeddings)
                    .await?;
            let score = aggregate_score(&expansion.entries, &matrix);
            let comment_scores = per_comment_scores(&expansion.entries, &matrix);
            let items = selector.select(&comment_scores, &expansion.seed, comments, store)?;

            tracing::debug!(
                drug,
                keyword = %expansion.seed,
                score,
                evidence = items.len(),
                "scored keyword"
            );

            scores.push(KeywordScore {
                keyword: expansion.seed.clone(),
                score,
            });
            evidence.extend(items);
        }

        tracing::info!(
            drug,
            comments = comments.len(),
            keywords = expansions.len(),
            "drug analysis complete"
        );

        Ok(DrugReport {
            drug: drug.to_string(),
            comment_count: comments.len(),
            scores,
            evidence,
        })
    }

    /// Run the full analysis over a set of comment records.
    ///
    /// 1. Load the records into an [`AnnotationStore`].
    /// 2. Expand the seed keywords once.
    /// 3. Analyze each drug, at most `max_concurrent_drugs` at a time; reports
    ///    come back in first-seen drug order regardless of completion order.
    /// 4. Return the annotated records and the per-drug reports.
    ///
    /// # Errors
    ///
    /// The first provider failure aborts the run.
    pub async fn analyze_corpus(
        &self,
        seeds: &[String],
        records: Vec<CommentRecord>,
    ) -> Result<CorpusReport, EngineError> {
        let store = AnnotationStore::new(records);
        let expansions = self.expand_keywords(seeds).await?;

        tracing::info!(
            comments = store.len(),
            drugs = store.drugs().len(),
            keywords = expansions.len(),
            "starting side-effect analysis"
        );

        let max_concurrent = self.settings.max_concurrent_drugs.max(1);
        let drugs: Vec<DrugReport> = stream::iter(store.drugs())
            .map(|(drug, ids)| self.analyze_drug(drug, ids, &expansions, &store))
            .buffered(max_concurrent)
            .try_collect()
            .await?;

        Ok(CorpusReport {
            comments: store.into_records(),
            drugs,
        })
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
