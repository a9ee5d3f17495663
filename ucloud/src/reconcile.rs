//! Polls a resource until it reports one of a set of target statuses.

use crate::retry::{OperationOutcome, Retrier, RetryError};
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// A lifecycle status reported by the remote service.
pub trait Status: Clone + PartialEq + fmt::Debug {
    /// True for the status that stands for "the resource no longer exists".
    /// An absent resource satisfies a target set containing such a status.
    fn is_deleted(&self) -> bool;
}

/// What one poll saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<S> {
    Present(S),
    Absent,
}

#[derive(Debug, Error)]
pub enum WaitError<S, E> {
    /// The fetch itself failed permanently.
    #[error("status check failed: {0}")]
    Fetch(#[source] E),
    /// The polling policy was exhausted before a target status was seen.
    #[error("did not reach {expected:?} after {attempts} checks (last seen: {last_observed:?})")]
    NotConverged {
        expected: Vec<S>,
        last_observed: Option<Observation<S>>,
        attempts: u32,
    },
    #[error("status wait cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
enum Miss<S, E> {
    #[error("status is {0:?}")]
    Unexpected(Observation<S>),
    #[error("{0}")]
    Fetch(E),
}

/// The target that `observed` satisfies, if any.
pub fn matching_target<S: Status>(targets: &[S], observed: &Observation<S>) -> Option<S> {
    match observed {
        Observation::Absent => targets.iter().find(|target| target.is_deleted()).cloned(),
        Observation::Present(status) => targets.iter().find(|target| *target == status).cloned(),
    }
}

/// Polls `fetch` under `retrier` until the observed status is in `targets`.
///
/// `fetch` classifies its own failures: retryable ones are polled again like
/// an unexpected status, permanent ones end the wait with
/// [`WaitError::Fetch`]. Returns the matched target.
pub async fn wait_for_status<S, E, F, Fut>(
    retrier: &Retrier,
    targets: &[S],
    mut fetch: F,
) -> Result<S, WaitError<S, E>>
where
    S: Status,
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = OperationOutcome<Observation<S>, E>>,
{
    let result = retrier
        .run(|| {
            let poll = fetch();
            async move {
                match poll.await {
                    OperationOutcome::Success(observed) => {
                        match matching_target(targets, &observed) {
                            Some(target) => OperationOutcome::Success(target),
                            None => OperationOutcome::RetryableFailure(Miss::Unexpected(observed)),
                        }
                    }
                    OperationOutcome::RetryableFailure(err) => {
                        OperationOutcome::RetryableFailure(Miss::Fetch(err))
                    }
                    OperationOutcome::PermanentFailure(err) => {
                        OperationOutcome::PermanentFailure(Miss::Fetch(err))
                    }
                }
            }
        })
        .await;

    result.map_err(|err| match err {
        RetryError::Permanent(Miss::Fetch(err)) => WaitError::Fetch(err),
        RetryError::Permanent(Miss::Unexpected(observed)) => WaitError::NotConverged {
            expected: targets.to_vec(),
            last_observed: Some(observed),
            attempts: 1,
        },
        RetryError::Exhausted { attempts, last, .. } => WaitError::NotConverged {
            expected: targets.to_vec(),
            last_observed: match last {
                Miss::Unexpected(observed) => Some(observed),
                Miss::Fetch(_) => None,
            },
            attempts,
        },
        RetryError::Cancelled { .. } => WaitError::Cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, Clone, PartialEq)]
    enum Phase {
        Pending,
        Enabled,
        Deleted,
    }

    impl Status for Phase {
        fn is_deleted(&self) -> bool {
            matches!(self, Phase::Deleted)
        }
    }

    fn retrier(limit: Duration) -> Retrier {
        Retrier::new(
            RetryPolicy::default()
                .with_initial_interval(Duration::from_millis(200))
                .with_max_interval(Duration::from_secs(2))
                .with_max_elapsed_time(Some(limit)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn already_converged_fetches_once() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result = wait_for_status(
            &retrier(Duration::from_secs(60)),
            &[Phase::Enabled],
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                OperationOutcome::<_, String>::Success(Observation::Present(Phase::Enabled))
            },
        )
        .await;

        assert_eq!(result.unwrap(), Phase::Enabled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_resource_matches_deleted_target() {
        let result = wait_for_status(
            &retrier(Duration::from_secs(60)),
            &[Phase::Deleted],
            || async { OperationOutcome::<_, String>::Success(Observation::Absent) },
        )
        .await;

        assert_eq!(result.unwrap(), Phase::Deleted);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_resource_does_not_match_other_targets() {
        let result = wait_for_status(
            &retrier(Duration::from_secs(10)),
            &[Phase::Enabled],
            || async { OperationOutcome::<_, String>::Success(Observation::Absent) },
        )
        .await;

        match result {
            Err(WaitError::NotConverged { last_observed, .. }) => {
                assert_eq!(last_observed, Some(Observation::Absent));
            }
            other => panic!("expected NotConverged, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_status_transitions() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result = wait_for_status(
            &retrier(Duration::from_secs(60)),
            &[Phase::Enabled, Phase::Deleted],
            move || async move {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                let phase = if call < 3 { Phase::Pending } else { Phase::Enabled };
                OperationOutcome::<_, String>::Success(Observation::Present(phase))
            },
        )
        .await;

        assert_eq!(result.unwrap(), Phase::Enabled);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_fetch_errors_are_polled_again() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result = wait_for_status(
            &retrier(Duration::from_secs(60)),
            &[Phase::Enabled],
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    OperationOutcome::RetryableFailure("rate limited".to_string())
                } else {
                    OperationOutcome::Success(Observation::Present(Phase::Enabled))
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), Phase::Enabled);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_fetch_error_ends_the_wait() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result = wait_for_status(
            &retrier(Duration::from_secs(60)),
            &[Phase::Enabled],
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                OperationOutcome::<Observation<Phase>, _>::PermanentFailure(
                    "access denied".to_string(),
                )
            },
        )
        .await;

        assert!(matches!(result, Err(WaitError::Fetch(ref msg)) if msg == "access denied"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_status_reports_last_observation() {
        let result = wait_for_status(
            &retrier(Duration::from_secs(30)),
            &[Phase::Enabled],
            || async {
                OperationOutcome::<_, String>::Success(Observation::Present(Phase::Pending))
            },
        )
        .await;

        match result {
            Err(WaitError::NotConverged {
                expected,
                last_observed,
                attempts,
            }) => {
                assert_eq!(expected, vec![Phase::Enabled]);
                assert_eq!(last_observed, Some(Observation::Present(Phase::Pending)));
                assert!(attempts > 1);
            }
            other => panic!("expected NotConverged, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_the_wait() {
        let token = CancellationToken::new();
        let retrier = retrier(Duration::from_secs(600)).with_cancellation(token.clone());

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        let result = wait_for_status(&retrier, &[Phase::Enabled], || async {
            OperationOutcome::<_, String>::Success(Observation::Present(Phase::Pending))
        })
        .await;

        assert!(matches!(result, Err(WaitError::Cancelled)));
    }

    #[test]
    fn fetch_failure_is_the_source() {
        use std::error::Error as _;

        let err: WaitError<Phase, std::io::Error> =
            WaitError::Fetch(std::io::Error::other("access denied"));

        assert_eq!(err.to_string(), "status check failed: access denied");
        assert_eq!(err.source().unwrap().to_string(), "access denied");
    }

    #[test]
    fn matching_target_prefers_exact_status() {
        let targets = [Phase::Enabled, Phase::Deleted];
        assert_eq!(
            matching_target(&targets, &Observation::Present(Phase::Enabled)),
            Some(Phase::Enabled)
        );
        assert_eq!(
            matching_target(&targets, &Observation::Present(Phase::Pending)),
            None
        );
        assert_eq!(
            matching_target(&targets, &Observation::Absent),
            Some(Phase::Deleted)
        );
    }
}
