//! Fetch-retry controller
//!
//! One parameterized retry loop for every fetch-dependent operation. The
//! controller knows nothing about documents: the caller supplies the fetch
//! future and the acceptance predicate, and branches on [`FetchOutcome`].

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::parsing_error::{ParsingError, ParsingResult};

/// Retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Lower bound of the uniform backoff range (milliseconds)
    pub backoff_min_ms: u64,
    /// Upper bound of the uniform backoff range (milliseconds)
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_min_ms: 5_000,
            backoff_max_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff_min_ms: u64, backoff_max_ms: u64) -> Self {
        Self {
            max_attempts,
            backoff_min_ms,
            backoff_max_ms,
        }
    }

    /// A zero-attempt policy still performs one attempt.
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Draw a delay uniformly from the backoff range.
    pub fn draw_backoff(&self) -> Duration {
        let (low, high) = if self.backoff_min_ms <= self.backoff_max_ms {
            (self.backoff_min_ms, self.backoff_max_ms)
        } else {
            (self.backoff_max_ms, self.backoff_min_ms)
        };
        Duration::from_millis(fastrand::u64(low..=high))
    }
}

/// What a single attempt produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// Fetched, but rejected by the acceptance predicate
    Empty,
    TransientError(String),
    /// Non-recoverable error; ends the loop
    Fatal(String),
}

/// Record of one attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchAttempt {
    pub attempt_number: u32,
    pub outcome: AttemptOutcome,
    /// Delay slept after this attempt, `None` when no further attempt followed
    pub backoff: Option<Duration>,
}

/// Result of [`fetch_with_retry`]
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Accepted {
        document: T,
        attempts: Vec<FetchAttempt>,
    },
    /// Every attempt failed or was rejected
    Exhausted { attempts: Vec<FetchAttempt> },
    /// Cancellation was signalled before an acceptable document arrived
    Cancelled { attempts: Vec<FetchAttempt> },
    /// A non-recoverable error stopped the loop early
    Failed {
        error: ParsingError,
        attempts: Vec<FetchAttempt>,
    },
}

impl<T> FetchOutcome<T> {
    pub fn attempts(&self) -> &[FetchAttempt] {
        match self {
            Self::Accepted { attempts, .. }
            | Self::Exhausted { attempts }
            | Self::Cancelled { attempts }
            | Self::Failed { attempts, .. } => attempts,
        }
    }

    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn into_document(self) -> Option<T> {
        match self {
            Self::Accepted { document, .. } => Some(document),
            _ => None,
        }
    }
}

/// Run `fetch` until `is_acceptable` approves a result or the policy runs out.
///
/// Recoverable errors and rejected documents are retried after a jittered
/// backoff; the last attempt never sleeps. `fetch` receives the 1-based
/// attempt number.
pub async fn fetch_with_retry<T, F, Fut, A>(
    mut fetch: F,
    is_acceptable: A,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> FetchOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ParsingResult<T>>,
    A: Fn(&T) -> bool,
{
    let max_attempts = policy.effective_attempts();
    let mut attempts = Vec::with_capacity(max_attempts as usize);

    for attempt_number in 1..=max_attempts {
        if cancel.is_cancelled() {
            info!("Fetch cancelled before attempt {}", attempt_number);
            return FetchOutcome::Cancelled { attempts };
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Fetch cancelled during attempt {}", attempt_number);
                return FetchOutcome::Cancelled { attempts };
            }
            result = fetch(attempt_number) => result,
        };

        let outcome = match result {
            Ok(document) if is_acceptable(&document) => {
                attempts.push(FetchAttempt {
                    attempt_number,
                    outcome: AttemptOutcome::Success,
                    backoff: None,
                });
                debug!("✅ Attempt {}/{} accepted", attempt_number, max_attempts);
                return FetchOutcome::Accepted { document, attempts };
            }
            Ok(_) => AttemptOutcome::Empty,
            Err(error) if error.is_recoverable() => AttemptOutcome::TransientError(error.to_string()),
            Err(error) => {
                warn!("❌ Attempt {}/{} failed permanently: {}", attempt_number, max_attempts, error);
                attempts.push(FetchAttempt {
                    attempt_number,
                    outcome: AttemptOutcome::Fatal(error.to_string()),
                    backoff: None,
                });
                return FetchOutcome::Failed { error, attempts };
            }
        };

        if attempt_number == max_attempts {
            warn!(
                "Attempt {}/{} unsuccessful ({:?}); retries exhausted",
                attempt_number, max_attempts, outcome
            );
            attempts.push(FetchAttempt {
                attempt_number,
                outcome,
                backoff: None,
            });
            break;
        }

        let delay = policy.draw_backoff();
        warn!(
            "🔄 Attempt {}/{} unsuccessful ({:?}); retrying in {}ms",
            attempt_number,
            max_attempts,
            outcome,
            delay.as_millis()
        );
        attempts.push(FetchAttempt {
            attempt_number,
            outcome,
            backoff: Some(delay),
        });

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Fetch cancelled during backoff after attempt {}", attempt_number);
                return FetchOutcome::Cancelled { attempts };
            }
            () = tokio::time::sleep(delay) => {}
        }
    }

    FetchOutcome::Exhausted { attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, 0, 0)
    }

    #[tokio::test]
    async fn always_rejected_makes_exactly_max_attempts() {
        let calls = Cell::new(0u32);
        let outcome = fetch_with_retry(
            |_| {
                calls.set(calls.get() + 1);
                async { Ok::<_, ParsingError>("<html></html>".to_string()) }
            },
            |_| false,
            &instant_policy(3),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(calls.get(), 3);
        match outcome {
            FetchOutcome::Exhausted { attempts } => {
                assert_eq!(attempts.len(), 3);
                assert!(attempts.iter().all(|a| a.outcome == AttemptOutcome::Empty));
                assert_eq!(attempts[2].backoff, None);
                assert!(attempts[..2].iter().all(|a| a.backoff.is_some()));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_accepted() {
        let outcome = fetch_with_retry(
            |attempt| async move {
                if attempt < 3 {
                    Err(ParsingError::transient_fetch("https://a.example", "timeout"))
                } else {
                    Ok(attempt)
                }
            },
            |_| true,
            &instant_policy(5),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome.attempts().len(), 3);
        assert!(matches!(
            outcome.attempts()[0].outcome,
            AttemptOutcome::TransientError(_)
        ));
        assert_eq!(outcome.into_document(), Some(3));
    }

    #[tokio::test]
    async fn non_recoverable_error_fails_fast() {
        let calls = Cell::new(0u32);
        let outcome = fetch_with_retry(
            |_| {
                calls.set(calls.get() + 1);
                async {
                    Err::<String, _>(ParsingError::PageNotFound {
                        url: "https://a.example/missing".into(),
                    })
                }
            },
            |_| true,
            &instant_policy(3),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(
            outcome,
            FetchOutcome::Failed {
                error: ParsingError::PageNotFound { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy::new(3, 60_000, 60_000);
        let outcome = fetch_with_retry(
            |_| {
                cancel.cancel();
                async { Ok::<_, ParsingError>(String::new()) }
            },
            |doc: &String| !doc.is_empty(),
            &policy,
            &cancel,
        )
        .await;

        match outcome {
            FetchOutcome::Cancelled { attempts } => assert_eq!(attempts.len(), 1),
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_token_means_no_attempts() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = fetch_with_retry(
            |_| async { Ok::<_, ParsingError>(1) },
            |_| true,
            &instant_policy(3),
            &cancel,
        )
        .await;
        assert!(matches!(outcome, FetchOutcome::Cancelled { ref attempts } if attempts.is_empty()));
    }

    #[test]
    fn backoff_stays_in_range() {
        let policy = RetryPolicy::new(3, 5, 10);
        for _ in 0..100 {
            let delay = policy.draw_backoff().as_millis();
            assert!((5..=10).contains(&delay));
        }
        assert_eq!(RetryPolicy::new(0, 0, 0).effective_attempts(), 1);
    }
}
