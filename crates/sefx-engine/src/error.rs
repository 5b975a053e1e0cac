use thiserror::Error;

use crate::annotations::CommentId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding provider error: {0}")]
    Embedding(String),

    #[error("failed to read synonym lexicon {path}: {source}")]
    SynonymsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse synonym lexicon: {0}")]
    SynonymsParse(#[from] serde_yaml::Error),

    #[error("{scores} scores do not line up with {comments} comments")]
    Misaligned { scores: usize, comments: usize },

    #[error("annotation store has no comment {0}")]
    UnknownComment(CommentId),
}
