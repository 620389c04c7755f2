//! services/api/src/adapters/retry.rs
//!
//! Wraps any `RecipeGenerationService` with a per-attempt timeout and a small,
//! fixed number of attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use recipe_core::ports::{PortError, PortResult, RecipeGenerationService};
use tracing::warn;

const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

pub struct RetryingGenerationService {
    inner: Arc<dyn RecipeGenerationService>,
    timeout: Duration,
    max_attempts: u32,
    backoff: Duration,
}

impl RetryingGenerationService {
    /// `max_attempts` counts the first call; values below one are treated as one.
    pub fn new(inner: Arc<dyn RecipeGenerationService>, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            inner,
            timeout,
            max_attempts: max_attempts.max(1),
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

#[async_trait]
impl RecipeGenerationService for RetryingGenerationService {
    async fn generate(&self, prompt_text: &str) -> PortResult<String> {
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, self.inner.generate(prompt_text)).await {
                Ok(result) => result,
                Err(_) => Err(PortError::Unexpected(format!(
                    "generation timed out after {:?}",
                    self.timeout
                ))),
            };

            match outcome {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_attempts => {
                    warn!(attempt, error = %e, "Recipe generation attempt failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails until `failures` calls have been made, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RecipeGenerationService for Flaky {
        async fn generate(&self, _prompt_text: &str) -> PortResult<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(PortError::Unexpected("flaky".to_string()))
            } else {
                Ok("{}".to_string())
            }
        }
    }

    struct Hangs;

    #[async_trait]
    impl RecipeGenerationService for Hangs {
        async fn generate(&self, _prompt_text: &str) -> PortResult<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".to_string())
        }
    }

    fn flaky(failures: u32) -> Arc<Flaky> {
        Arc::new(Flaky {
            failures,
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let inner = flaky(1);
        let service = RetryingGenerationService::new(inner.clone(), Duration::from_secs(1), 2)
            .with_backoff(Duration::from_millis(1));

        assert_eq!(service.generate("p").await.unwrap(), "{}");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let inner = flaky(5);
        let service = RetryingGenerationService::new(inner.clone(), Duration::from_secs(1), 3)
            .with_backoff(Duration::from_millis(1));

        assert!(service.generate("p").await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_slow_attempts_time_out() {
        let service = RetryingGenerationService::new(Arc::new(Hangs), Duration::from_millis(20), 1);
        let err = service.generate("p").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
