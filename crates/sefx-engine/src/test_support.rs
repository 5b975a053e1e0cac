//! Deterministic in-memory providers for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::embeddings::EmbeddingProvider;
use crate::error::EngineError;

/// Looks vectors up in a fixed table; unknown text is a provider error.
pub(crate) struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    embedded: AtomicUsize,
}

impl FakeEmbedder {
    pub(crate) fn new(table: &[(&str, &[f32])]) -> Self {
        Self {
            vectors: table
                .iter()
                .map(|(text, v)| ((*text).to_string(), v.to_vec()))
                .collect(),
            embedded: AtomicUsize::new(0),
        }
    }

    /// Total number of texts this provider has been asked to embed.
    pub(crate) fn embedded_texts(&self) -> usize {
        self.embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EngineError> {
        self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(*t)
                    .cloned()
                    .ok_or_else(|| EngineError::Embedding(format!("unknown text '{t}'")))
            })
            .collect()
    }
}
