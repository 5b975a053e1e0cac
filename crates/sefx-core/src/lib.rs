//! Shared data model, ingestion helpers and configuration for `sefx`.
//!
//! Everything here is plain data shaping: loading review rows, cleaning their
//! text, grouping them by drug, and reading the keyword vocabulary and engine
//! settings. The scoring itself lives in `sefx-engine`.

mod app_config;
mod comments;
mod config;
mod text;
mod vocabulary;

use thiserror::Error;

pub use app_config::EngineConfig;
pub use comments::{
    drug_names, group_by_drug, load_reviews, parse_reviews_json, records_from_reviews,
    retain_long_comments, CommentRecord, ReviewRecord,
};
pub use config::{load_engine_config, load_engine_config_from_env};
pub use text::{preprocess_text, word_count};
pub use vocabulary::{load_vocabulary, parse_vocabulary, Vocabulary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read vocabulary file {path}: {source}")]
    VocabularyFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse vocabulary file: {0}")]
    VocabularyFileParse(#[from] serde_yaml::Error),

    #[error("vocabulary validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// A review row is missing a field the engine cannot do without.
    #[error("malformed review at index {index}: missing {field}")]
    MalformedRecord { index: usize, field: &'static str },

    #[error("failed to read reviews from {path}: {source}")]
    ReviewsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse reviews JSON: {0}")]
    ReviewsParse(#[from] serde_json::Error),
}
