//! Bounded-retry execution of a single workstream: attempt zero plus
//! `max_retries` further attempts, a fixed delay between attempts (read
//! once, never re-read per attempt), and immediate return on cancellation.
//! The attempt-counter loop mirrors the retry pattern the worker-facing
//! HTTP client in the corpus uses for transient provider errors.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of a retried operation: the value, plus how many attempts beyond
/// the first were needed (`retries = k - 1` when it succeeded on attempt k).
pub struct RetryOutcome<T> {
    pub value: T,
    pub retries: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("cancelled")]
    Cancelled,
    #[error("exhausted {attempts} attempt(s): {source}")]
    Exhausted { attempts: u32, #[source] source: E },
}

/// Run `operation` up to `policy.max_retries + 1` times. Checks `cancel`
/// before every attempt and before every inter-attempt delay; a cancelled
/// token aborts immediately without starting a further attempt.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, cancel: &CancellationToken, mut operation: F) -> Result<RetryOutcome<T>, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    let mut last_err = None;
    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => {
                return Ok(RetryOutcome {
                    value,
                    retries: attempt - 1,
                })
            }
            Err(err) => {
                last_err = Some(err);
                if attempt > policy.max_retries {
                    break;
                }
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(RetryError::Cancelled),
                    () = tokio::time::sleep(policy.delay) => {}
                }
            }
        }
    }
    Err(RetryError::Exhausted {
        attempts: attempt,
        source: last_err.expect("loop only breaks after recording an error"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_on_first_attempt_with_zero_retries_reported() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let outcome: RetryOutcome<u32> = retry(policy, &cancel, |attempt| async move { Ok::<_, String>(attempt) })
            .await
            .unwrap();
        assert_eq!(outcome.value, 1);
        assert_eq!(outcome.retries, 0);
    }

    #[tokio::test]
    async fn succeeding_on_attempt_k_reports_k_minus_one_retries() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let outcome = retry(policy, &cancel, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err::<u32, String>("not yet".to_string())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(outcome.retries, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_retries() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let err = retry(policy, &cancel, |_attempt| async move { Err::<u32, String>("nope".to_string()) })
            .await
            .unwrap_err();
        assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn cancellation_returns_immediately() {
        let policy = RetryPolicy::new(5, Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = retry(policy, &cancel, |_attempt| async move { Ok::<u32, String>(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, RetryError::Cancelled));
    }
}
