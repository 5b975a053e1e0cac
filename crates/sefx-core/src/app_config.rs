use std::path::PathBuf;

/// Settings for one scoring run.
///
/// Built from `SEFX_*` environment variables by
/// [`load_engine_config`](crate::load_engine_config); [`Default`] carries the
/// same defaults the loader falls back to.
#[derive(Clone, PartialEq)]
pub struct EngineConfig {
    pub tei_url: String,
    pub tei_api_key: Option<String>,
    pub embed_timeout_secs: u64,
    pub embed_batch_size: usize,
    pub embed_max_retries: u32,
    pub embed_retry_backoff_ms: u64,
    /// Minimum seed/term cosine similarity for a term to enter an expansion.
    pub similarity_threshold: f32,
    pub expansion_top_k: usize,
    pub evidence_top_k: usize,
    /// Percentile of the per-comment scores a comment must reach to match.
    pub match_percentile: f64,
    /// Comments with this many words or fewer are dropped. `0` keeps all.
    pub min_comment_words: usize,
    pub max_concurrent_drugs: usize,
    pub vocabulary_path: PathBuf,
    pub synonyms_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tei_url: "http://localhost:8080".to_string(),
            tei_api_key: None,
            embed_timeout_secs: 30,
            embed_batch_size: 64,
            embed_max_retries: 2,
            embed_retry_backoff_ms: 500,
            similarity_threshold: 0.8,
            expansion_top_k: 10,
            evidence_top_k: 10,
            match_percentile: 50.0,
            min_comment_words: 0,
            max_concurrent_drugs: 1,
            vocabulary_path: PathBuf::from("./config/vocabulary.yaml"),
            synonyms_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("tei_url", &self.tei_url)
            .field(
                "tei_api_key",
                &self.tei_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("embed_timeout_secs", &self.embed_timeout_secs)
            .field("embed_batch_size", &self.embed_batch_size)
            .field("embed_max_retries", &self.embed_max_retries)
            .field("embed_retry_backoff_ms", &self.embed_retry_backoff_ms)
            .field("similarity_threshold", &self.similarity_threshold)
            .field("expansion_top_k", &self.expansion_top_k)
            .field("evidence_top_k", &self.evidence_top_k)
            .field("match_percentile", &self.match_percentile)
            .field("min_comment_words", &self.min_comment_words)
            .field("max_concurrent_drugs", &self.max_concurrent_drugs)
            .field("vocabulary_path", &self.vocabulary_path)
            .field("synonyms_path", &self.synonyms_path)
            .field("log_level", &self.log_level)
            .finish()
    }
}
