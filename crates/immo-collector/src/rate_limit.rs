//! Retry with exponential backoff for transient search API failures.
//!
//! 429 responses, 5xx responses and network errors are retried. Everything
//! else (4xx, unparseable bodies, missing listing arrays) fails immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::CollectorError;

/// Upper bound on any single wait, including server-provided `Retry-After`.
pub(crate) const MAX_BACKOFF_MS: u64 = 30_000;

fn is_retriable(err: &CollectorError) -> bool {
    match err {
        CollectorError::RateLimited { .. } | CollectorError::Http(_) => true,
        CollectorError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Wait before retry number `attempt + 1`: the server's `Retry-After` when it
/// sent one, otherwise `backoff_base_ms * 2^attempt`, capped at
/// [`MAX_BACKOFF_MS`].
pub(crate) fn backoff_delay(attempt: u32, backoff_base_ms: u64, err: &CollectorError) -> Duration {
    let server_hint = match err {
        CollectorError::RateLimited {
            retry_after_secs: Some(secs),
        } => Some(secs.saturating_mul(1_000)),
        _ => None,
    };
    let delay_ms = server_hint
        .unwrap_or_else(|| backoff_base_ms.saturating_mul(1u64 << attempt.min(62)));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

/// Runs `operation`, retrying transient errors up to `max_retries` more times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, CollectorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollectorError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay = backoff_delay(attempt, backoff_base_ms, &err);
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(MAX_BACKOFF_MS),
            error = %err,
            "transient search API error, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited(retry_after_secs: Option<u64>) -> CollectorError {
        CollectorError::RateLimited { retry_after_secs }
    }

    fn status(status: u16) -> CollectorError {
        CollectorError::UnexpectedStatus {
            status,
            url: "http://search.test/immo".to_owned(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, CollectorError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limit_and_server_errors_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                match cc.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(rate_limited(Some(0))),
                    1 => Err(status(503)),
                    _ => Ok::<u32, CollectorError>(99),
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, CollectorError>(rate_limited(None))
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(CollectorError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, CollectorError>(status(403))
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(CollectorError::UnexpectedStatus { status: 403, .. })
        ));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let err = status(500);
        assert_eq!(backoff_delay(0, 750, &err), Duration::from_millis(750));
        assert_eq!(backoff_delay(2, 750, &err), Duration::from_millis(3_000));
    }

    #[test]
    fn backoff_prefers_retry_after_and_is_capped() {
        assert_eq!(
            backoff_delay(0, 750, &rate_limited(Some(4))),
            Duration::from_secs(4)
        );
        assert_eq!(
            backoff_delay(0, 750, &rate_limited(Some(600))),
            Duration::from_millis(MAX_BACKOFF_MS)
        );
        assert_eq!(
            backoff_delay(40, 750, &rate_limited(None)),
            Duration::from_millis(MAX_BACKOFF_MS)
        );
    }
}
