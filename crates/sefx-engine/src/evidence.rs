//! Percentile thresholding of per-comment scores, comment annotation, and
//! top-K evidence ranking.

use crate::annotations::{AnnotationStore, CommentId};
use crate::error::EngineError;
use crate::types::EvidenceItem;

pub const DEFAULT_EVIDENCE_TOP_K: usize = 10;
pub const DEFAULT_MATCH_PERCENTILE: f64 = 50.0;

/// The `p`-th percentile of `values`, interpolating linearly between the two
/// closest ranks.
///
/// Returns `None` for an empty slice. `p` is clamped to `[0, 100]`.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    #[allow(clippy::cast_precision_loss)]
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = rank - rank.floor();

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Decides which comments exhibit a keyword and picks the best of them as
/// evidence.
///
/// A comment matches when its score is at or above the configured percentile
/// of its drug's scores; at the default median roughly half of a drug's
/// comments match every keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceSelector {
    top_k: usize,
    percentile: f64,
}

impl Default for EvidenceSelector {
    fn default() -> Self {
        Self::new(DEFAULT_EVIDENCE_TOP_K)
    }
}

impl EvidenceSelector {
    #[must_use]
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            percentile: DEFAULT_MATCH_PERCENTILE,
        }
    }

    #[must_use]
    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    /// Annotate matching comments with `keyword` and return their top-K
    /// evidence items, highest score first.
    ///
    /// `scores` and `comments` are aligned by index. Every matching comment is
    /// annotated, not just the returned top K. Calling this twice for the same
    /// comments and keyword annotates them twice.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Misaligned`] if `scores` and `comments` differ in
    /// length, or [`EngineError::UnknownComment`] for ids outside `store`.
    pub fn select(
        &self,
        scores: &[f64],
        keyword: &str,
        comments: &[CommentId],
        store: &AnnotationStore,
    ) -> Result<Vec<EvidenceItem>, EngineError> {
        if scores.len() != comments.len() {
            return Err(EngineError::Misaligned {
                scores: scores.len(),
                comments: comments.len(),
            });
        }
        let Some(threshold) = percentile(scores, self.percentile) else {
            return Ok(Vec::new());
        };

        let mut items = Vec::new();
        for (&id, &score) in comments.iter().zip(scores) {
            if score < threshold {
                continue;
            }
            store.append(id, keyword)?;
            let (Some(drug), Some(comment)) = (store.drug_name(id), store.raw_text(id)) else {
                return Err(EngineError::UnknownComment(id));
            };
            items.push(EvidenceItem {
                drug: drug.to_string(),
                side_effect: keyword.to_string(),
                comment: comment.to_string(),
                score,
            });
        }

        tracing::debug!(
            keyword,
            threshold,
            matched = items.len(),
            total = comments.len(),
            "selected evidence"
        );

        items.sort_by(|a, b| b.score.total_cmp(&a.score));
        items.truncate(self.top_k);
        Ok(items)
    }
}
