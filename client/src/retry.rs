//! Retry with exponential backoff for idempotent operations.
//!
//! Applied to connection attempts and storage reads only. A signed
//! submission is never retried here: resubmitting could apply it twice.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::RetryConfig;
use crate::{ErrorKind, ForgeError};

/// Bounded, jitter-free doubling backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2×base, 4×base, ... capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `f` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Only transient errors are retried. Exhaustion surfaces
    /// `NETWORK_ERROR` wrapping the last failure, except that an exhausted
    /// connection step keeps its `CONNECTION_FAILED` kind.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, ForgeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ForgeError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    return Err(exhausted(operation, attempt, e));
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn exhausted(operation: &str, attempts: u32, last: ForgeError) -> ForgeError {
    if last.kind() == ErrorKind::ConnectionFailed {
        return last;
    }
    ForgeError::new(
        ErrorKind::NetworkError,
        format!(
            "{operation} failed after {attempts} attempts: {}",
            last.message()
        ),
    )
    .with_cause(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(500),
        }
    }

    #[test]
    fn delays_double_then_cap() {
        let p = policy();
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(3), Duration::from_millis(500));
        assert_eq!(p.delay_for(40), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_exhaust_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let started = tokio::time::Instant::now();
        let result: Result<(), _> = policy()
            .run("read", || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ForgeError::new(ErrorKind::NetworkError, "socket timeout"))
                }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(err.message().contains("after 3 attempts"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(started.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = policy()
            .run("read", || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ForgeError::validation("bad id"))
                }
            })
            .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ValidationError);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let value = policy()
            .run("read", || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ForgeError::new(ErrorKind::NetworkError, "blip"))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_connection_keeps_kind() {
        let result: Result<(), _> = policy()
            .run("connect", || async {
                Err(ForgeError::new(ErrorKind::ConnectionFailed, "all endpoints failed"))
            })
            .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ConnectionFailed);
    }
}
