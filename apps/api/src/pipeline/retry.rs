//! Bounded retry of a single asynchronous unit of work.

use std::future::Future;

use tracing::warn;

use crate::pipeline::backoff::RetryPolicy;
use crate::pipeline::rate_limit::{classify, ErrorClass};
use crate::pipeline::StageError;

/// Runs `attempt_fn` until it succeeds or the retry budget is spent.
///
/// On each failure the error text is classified: rate-limited failures wait
/// the provider-suggested duration, generic failures back off exponentially.
/// Non-retryable errors (missing artifact, malformed response) propagate
/// immediately. The final propagated error is the one from the last attempt,
/// untouched, so callers can report a meaningful reason.
pub async fn invoke<T, F, Fut>(policy: &RetryPolicy, mut attempt_fn: F) -> Result<T, StageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StageError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() || policy.is_exhausted(attempt) {
            return Err(err);
        }

        let class = classify(&err.to_string());
        let delay = policy.delay_for(class, attempt);
        match class {
            ErrorClass::RateLimited { .. } => warn!(
                "Rate limit hit, waiting {}ms before retry {}/{}",
                delay.as_millis(),
                attempt + 1,
                policy.max_retries + 1
            ),
            ErrorClass::Generic => warn!(
                "Error occurred, waiting {}ms before retry {}/{}: {err}",
                delay.as_millis(),
                attempt + 1,
                policy.max_retries + 1
            ),
        }
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(1000),
            max_retries: 3,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = invoke(&policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, StageError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = invoke(&policy(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(StageError::Provider("transient".to_string()))
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_stops_after_four_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = invoke(&policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StageError::Provider("still broken".to_string()))
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "still broken");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_artifact_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = invoke(&policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StageError::MissingArtifact("no such file".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_failures_back_off_exponentially() {
        let start = tokio::time::Instant::now();
        let _: Result<(), _> = invoke(&policy(), || async {
            Err(StageError::Provider("boom".to_string()))
        })
        .await;
        // 1s + 2s + 4s between the four attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_failure_waits_suggested_duration() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        let result = invoke(&policy(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(StageError::Provider(
                    "Rate limit reached, try again in 2.5s".to_string(),
                ))
            } else {
                Ok(())
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(start.elapsed(), Duration::from_millis(2500));
    }
}
