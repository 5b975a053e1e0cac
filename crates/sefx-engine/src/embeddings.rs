//! Embedding providers: the capability trait, a TEI (Text Embeddings
//! Inference) HTTP client, and a memoizing wrapper.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use sefx_core::EngineConfig;

use crate::error::EngineError;
use crate::retry::RetryPolicy;

/// Default number of texts per /embed call.
const DEFAULT_BATCH_SIZE: usize = 64;

/// Maps text to fixed-length dense vectors.
///
/// Implementations must be deterministic for identical input within a run and
/// must return exactly one vector per input, in input order. Failures are
/// surfaced as errors; callers never substitute default vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EngineError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let texts = [text];
        let mut vectors = self.embed_batch(&texts).await?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(EngineError::Embedding(
                "provider did not return exactly one vector".to_string(),
            )),
        }
    }
}

/// TEI HTTP client.
pub struct TeiClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    batch_size: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [&'a str],
    truncate: bool,
}

impl TeiClient {
    /// Create a client for the TEI server at `tei_url` with a per-request timeout.
    ///
    /// Retries are disabled until [`TeiClient::with_retries`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(tei_url: &str, timeout_secs: u64) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/embed", tei_url.trim_end_matches('/')),
            api_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Self::new(&config.tei_url, config.embed_timeout_secs)?
            .with_batch_size(config.embed_batch_size)
            .with_retries(config.embed_max_retries, config.embed_retry_backoff_ms);
        Ok(match &config.tei_api_key {
            Some(key) => client.with_api_key(key),
            None => client,
        })
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.retry = RetryPolicy::new(max_retries, backoff_base_ms);
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    async fn embed_chunk(&self, chunk: &[&str]) -> Result<Vec<Vec<f32>>, EngineError> {
        let request = EmbedRequest {
            inputs: chunk,
            truncate: true,
        };
        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?.error_for_status()?;
        let embeddings: Vec<Vec<f32>> = response.json().await?;

        if embeddings.len() != chunk.len() {
            return Err(EngineError::Embedding(format!(
                "TEI returned {} embeddings for {} inputs",
                embeddings.len(),
                chunk.len()
            )));
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for TeiClient {
    /// Texts are sent in groups of `batch_size` (64 by default); oversized
    /// inputs are truncated server-side rather than rejected.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EngineError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.retry.run(|| self.embed_chunk(chunk)).await?;
            all_embeddings.extend(embeddings);
        }

        tracing::debug!(count = texts.len(), "embedded texts via TEI");
        Ok(all_embeddings)
    }
}

/// Memoizes another provider by exact input text.
///
/// The same official terms, expansion terms and comments recur across drugs
/// and keywords; each distinct text reaches the inner provider once per run.
pub struct CachedEmbedder<P> {
    inner: P,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl<P> CachedEmbedder<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct texts embedded so far.
    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EngineError> {
        let missing: Vec<&str> = {
            let cache = self.cache.lock().await;
            let mut missing: Vec<&str> = texts
                .iter()
                .copied()
                .filter(|t| !cache.contains_key(*t))
                .collect();
            missing.sort_unstable();
            missing.dedup();
            missing
        };

        // The lock is released while the inner provider runs.
        if !missing.is_empty() {
            let vectors = self.inner.embed_batch(&missing).await?;
            if vectors.len() != missing.len() {
                return Err(EngineError::Embedding(format!(
                    "provider returned {} embeddings for {} inputs",
                    vectors.len(),
                    missing.len()
                )));
            }
            let mut cache = self.cache.lock().await;
            for (text, vector) in missing.into_iter().zip(vectors) {
                cache.insert(text.to_string(), vector);
            }
        }

        let cache = self.cache.lock().await;
        texts
            .iter()
            .map(|t| {
                cache.get(*t).cloned().ok_or_else(|| {
                    EngineError::Embedding(format!("no cached embedding for '{t}'"))
                })
            })
            .collect()
    }
}
