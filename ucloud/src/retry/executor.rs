use super::RetryPolicy;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome<T, E> {
    Success(T),
    /// Worth another attempt after a delay.
    RetryableFailure(E),
    /// Stops the retry loop immediately.
    PermanentFailure(E),
}

impl<T, E> OperationOutcome<T, E> {
    pub fn from_result(result: Result<T, E>, is_retryable: impl FnOnce(&E) -> bool) -> Self {
        match result {
            Ok(value) => OperationOutcome::Success(value),
            Err(err) if is_retryable(&err) => OperationOutcome::RetryableFailure(err),
            Err(err) => OperationOutcome::PermanentFailure(err),
        }
    }
}

/// Why the retry loop stopped without a success.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation reported a permanent failure.
    #[error("permanent failure: {0}")]
    Permanent(#[source] E),
    /// The policy ran out of attempts or time. `last` is the final retryable
    /// failure.
    #[error("gave up after {attempts} attempts in {elapsed:?}: {last}")]
    Exhausted {
        attempts: u32,
        elapsed: Duration,
        #[source]
        last: E,
    },
    /// The cancellation token fired before or between attempts.
    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    policy: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Invokes `operation` until it succeeds, fails permanently or the policy
    /// is exhausted.
    ///
    /// The elapsed-time ceiling is checked before each sleep: if the next delay
    /// would cross it, the loop stops with the last retryable error instead of
    /// sleeping. A zero ceiling counts as no ceiling.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = OperationOutcome<T, E>>,
    {
        let start = Instant::now();
        let max_elapsed = self.policy.max_elapsed_time.filter(|limit| !limit.is_zero());
        let mut attempts = 0u32;

        loop {
            if self.is_cancelled() {
                return Err(RetryError::Cancelled { attempts });
            }

            attempts += 1;
            let last = match operation().await {
                OperationOutcome::Success(value) => return Ok(value),
                OperationOutcome::PermanentFailure(err) => {
                    debug!(attempt = attempts, error = %err, "permanent failure, not retrying");
                    return Err(RetryError::Permanent(err));
                }
                OperationOutcome::RetryableFailure(err) => err,
            };

            let elapsed = start.elapsed();
            if self
                .policy
                .max_attempts
                .is_some_and(|max_attempts| attempts >= max_attempts)
            {
                return Err(RetryError::Exhausted {
                    attempts,
                    elapsed,
                    last,
                });
            }

            let delay = self.policy.jittered_interval(attempts);
            if let Some(max_elapsed) = max_elapsed {
                if elapsed + delay > max_elapsed {
                    return Err(RetryError::Exhausted {
                        attempts,
                        elapsed,
                        last,
                    });
                }
            }

            debug!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %last,
                "retryable failure, backing off"
            );

            if !self.sleep(delay).await {
                return Err(RetryError::Cancelled { attempts });
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Returns false when cancelled mid-sleep.
    async fn sleep(&self, delay: Duration) -> bool {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = token.cancelled() => false,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }
}

/// Convenience wrapper for a one-off [`Retrier`] without cancellation.
pub async fn execute_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = OperationOutcome<T, E>>,
{
    Retrier::new(policy.clone()).run(operation).await
}
