//! Cosine similarity and the term × comment similarity matrix.

use crate::embeddings::EmbeddingProvider;
use crate::error::EngineError;
use crate::types::ExpansionEntry;

/// Cosine similarity `dot(a, b) / (‖a‖·‖b‖)`.
///
/// Returns `0.0` when either vector has zero norm, either is empty, or the
/// dimensions differ. Accumulates in `f64`.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    #[allow(clippy::cast_possible_truncation)]
    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32;
    similarity.clamp(-1.0, 1.0)
}

/// Similarities of one expansion term against every comment of a drug.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityRow {
    pub term: String,
    pub values: Vec<f32>,
}

/// One [`SimilarityRow`] per expansion term, each aligned by index with the
/// comment embeddings it was built from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityMatrix {
    rows: Vec<SimilarityRow>,
    comment_count: usize,
}

impl SimilarityMatrix {
    /// Assemble a matrix from precomputed rows.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Misaligned`] if a row's length differs from
    /// `comment_count`.
    pub fn from_rows(rows: Vec<SimilarityRow>, comment_count: usize) -> Result<Self, EngineError> {
        if let Some(bad) = rows.iter().find(|r| r.values.len() != comment_count) {
            return Err(EngineError::Misaligned {
                scores: bad.values.len(),
                comments: comment_count,
            });
        }
        Ok(Self {
            rows,
            comment_count,
        })
    }

    /// The similarity row of `term`, if the term is in the matrix.
    #[must_use]
    pub fn row(&self, term: &str) -> Option<&[f32]> {
        self.rows
            .iter()
            .find(|r| r.term == term)
            .map(|r| r.values.as_slice())
    }

    #[must_use]
    pub fn rows(&self) -> &[SimilarityRow] {
        &self.rows
    }

    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.comment_count
    }
}

/// Compute the similarity of every expansion term against every comment.
///
/// Each term is embedded once (one batched provider call for all terms).
///
/// # Errors
///
/// Propagates provider failures; no default vectors are substituted.
pub async fn build_similarity_matrix(
    embedder: &dyn EmbeddingProvider,
    entries: &[ExpansionEntry],
    comment_embeddings: &[Vec<f32>],
) -> Result<SimilarityMatrix, EngineError> {
    if entries.is_empty() {
        return SimilarityMatrix::from_rows(Vec::new(), comment_embeddings.len());
    }

    let terms: Vec<&str> = entries.iter().map(|e| e.term.as_str()).collect();
    let term_embeddings = embedder.embed_batch(&terms).await?;
    if term_embeddings.len() != terms.len() {
        return Err(EngineError::Embedding(format!(
            "provider returned {} embeddings for {} terms",
            term_embeddings.len(),
            terms.len()
        )));
    }

    let rows = entries
        .iter()
        .zip(&term_embeddings)
        .map(|(entry, term_vec)| SimilarityRow {
            term: entry.term.clone(),
            values: comment_embeddings
                .iter()
                .map(|comment_vec| cosine_similarity(term_vec, comment_vec))
                .collect(),
        })
        .collect();

    SimilarityMatrix::from_rows(rows, comment_embeddings.len())
}
