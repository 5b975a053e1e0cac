//! Relevance scoring engine for drug side effects.
//!
//! Expands seed side-effect keywords into weighted related terms via a
//! synonym source and embedding similarity, scores each keyword against a
//! drug's review comments, and selects the comments that best support each
//! score. Embeddings come from a TEI server or any other
//! [`EmbeddingProvider`].

pub mod annotations;
pub mod embeddings;
pub mod error;
pub mod evidence;
pub mod expander;
pub mod pipeline;
pub mod scorer;
pub mod similarity;
pub mod synonyms;
pub mod types;

mod retry;
#[cfg(test)]
mod test_support;

pub use annotations::{AnnotationStore, CommentId};
pub use embeddings::{CachedEmbedder, EmbeddingProvider, TeiClient};
pub use error::EngineError;
pub use evidence::{percentile, EvidenceSelector};
pub use expander::{KeywordExpander, STOP_WORDS};
pub use pipeline::Analyzer;
pub use scorer::{aggregate_score, per_comment_scores};
pub use similarity::{build_similarity_matrix, cosine_similarity, SimilarityMatrix, SimilarityRow};
pub use synonyms::{LexiconSynonyms, NoSynonyms, SynonymSource};
pub use types::{
    CorpusReport, DrugReport, EvidenceItem, ExpansionEntry, KeywordExpansion, KeywordScore,
    ScoringSettings,
};
