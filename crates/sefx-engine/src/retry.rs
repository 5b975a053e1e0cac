//! Retry policy for TEI `/embed` calls.
//!
//! Only transport-level failures are retried. Anything the provider answered
//! deliberately (4xx, malformed payloads, wrong vector counts) is returned at
//! once.

use std::future::Future;
use std::time::Duration;

use crate::error::EngineError;

const MAX_BACKOFF_MS: u64 = 30_000;

/// Timeouts, connection failures and 5xx responses.
pub(crate) fn is_retriable(err: &EngineError) -> bool {
    match err {
        EngineError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        EngineError::Embedding(_)
        | EngineError::SynonymsIo { .. }
        | EngineError::SynonymsParse(_)
        | EngineError::Misaligned { .. }
        | EngineError::UnknownComment(_) => false,
    }
}

/// How many times a failed embedding call is repeated and how long to wait
/// in between.
///
/// The wait before retry `n` is `backoff_base_ms · 2ⁿ⁻¹`, capped at 30 s,
/// then scaled by a random factor in `[0.75, 1.25]`. The default policy never
/// retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
        }
    }

    /// Un-jittered wait before retry number `retry` (1-based).
    fn base_delay(self, retry: u32) -> Duration {
        let doublings = retry.saturating_sub(1).min(20);
        let ms = self
            .backoff_base_ms
            .saturating_mul(1 << doublings)
            .min(MAX_BACKOFF_MS);
        Duration::from_millis(ms)
    }

    /// Await `call` until it succeeds, fails permanently, or the retry budget
    /// is spent. The last error is returned.
    pub(crate) async fn run<T, F, Fut>(self, mut call: F) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let mut retry = 0;
        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if retry >= self.max_retries || !is_retriable(&err) {
                return Err(err);
            }
            retry += 1;

            let delay = self
                .base_delay(retry)
                .mul_f64(rand::random_range(0.75..=1.25));
            tracing::warn!(
                retry,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "TEI request failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    async fn connect_error() -> EngineError {
        let err = reqwest::Client::new()
            .get("http://0.0.0.0:1")
            .send()
            .await
            .unwrap_err();
        EngineError::Http(err)
    }

    #[test]
    fn contract_errors_are_not_retriable() {
        assert!(!is_retriable(&EngineError::Embedding("bad".to_owned())));
        assert!(!is_retriable(&EngineError::Misaligned {
            scores: 1,
            comments: 2
        }));
    }

    #[tokio::test]
    async fn connect_error_is_retriable() {
        assert!(is_retriable(&connect_error().await));
    }

    #[test]
    fn delay_doubles_and_is_capped() {
        let policy = RetryPolicy::new(10, 500);
        assert_eq!(policy.base_delay(1), Duration::from_millis(500));
        assert_eq!(policy.base_delay(2), Duration::from_millis(1_000));
        assert_eq!(policy.base_delay(4), Duration::from_millis(4_000));
        assert_eq!(policy.base_delay(8), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(policy.base_delay(u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn default_policy_never_retries() {
        assert_eq!(RetryPolicy::default().max_retries, 0);
    }

    #[tokio::test]
    async fn success_needs_one_call() {
        let calls = &AtomicU32::new(0);
        let result = RetryPolicy::new(3, 0)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, EngineError>(7)
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn contract_errors_are_returned_at_once() {
        let calls = &AtomicU32::new(0);
        let result = RetryPolicy::new(3, 0)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(EngineError::Embedding("2 vectors for 3 inputs".to_owned()))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(EngineError::Embedding(_))));
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = &AtomicU32::new(0);
        let result = RetryPolicy::new(3, 0)
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(connect_error().await)
                } else {
                    Ok(99)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_is_one_call_plus_max_retries() {
        let calls = &AtomicU32::new(0);
        let result = RetryPolicy::new(2, 0)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(connect_error().await)
            })
            .await;
        assert!(matches!(result, Err(EngineError::Http(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
