//! Retry Executor
//!
//! Wraps one logical outbound call. Rate-limit rejections are re-issued after a
//! fixed backoff, up to a bounded number of retries; every other outcome is
//! returned as-is. Cancellation is checked before each attempt and raced
//! against each attempt and each backoff wait, and is never retried.

use crate::cancel::CancellationToken;
use crate::error::ApiError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(5000);

/// Bounded fixed-backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (total tries = this + 1).
    pub max_retry_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retry_attempts + 1
    }
}

/// Per-attempt context handed to the request factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 0 for the initial attempt.
    pub attempt: u32,
}

impl RetryAttempt {
    pub fn is_retry(&self) -> bool {
        self.attempt > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `make_request` until it stops being rate limited or retries run out.
    ///
    /// Each retry re-issues the call from scratch; the factory receives the
    /// attempt number but the request parameters it captured never change.
    pub async fn execute<T, F, Fut>(
        &self,
        mut make_request: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<T, ApiError>
    where
        F: FnMut(RetryAttempt) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = RetryAttempt { attempt: 0 };

        loop {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    debug!(attempt = attempt.attempt, "Cancellation observed before attempt");
                    return Err(ApiError::Cancelled);
                }
            }

            let result = race_cancel(make_request(attempt), cancel).await;

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if err.is_cancelled() {
                debug!(attempt = attempt.attempt, "Request cancelled in flight");
                return Err(err);
            }

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt.attempt >= self.policy.max_retry_attempts {
                warn!(
                    attempts = attempt.attempt + 1,
                    error = %err,
                    "Rate limit retries exhausted"
                );
                return Err(err);
            }

            warn!(
                attempt = attempt.attempt,
                backoff_ms = self.policy.backoff.as_millis() as u64,
                "Rate limited, backing off before retry"
            );

            race_cancel(
                async {
                    sleep(self.policy.backoff).await;
                    Ok(())
                },
                cancel,
            )
            .await?;

            attempt.attempt += 1;
        }
    }
}

/// Drive `fut` to completion unless the token fires first. Dropping the losing
/// future aborts whatever it was doing (e.g. an in-flight HTTP request).
async fn race_cancel<T, Fut>(fut: Fut, cancel: Option<&CancellationToken>) -> Result<T, ApiError>
where
    Fut: Future<Output = Result<T, ApiError>>,
{
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(ApiError::Cancelled),
                result = fut => result,
            }
        }
        None => fut.await,
    }
}
