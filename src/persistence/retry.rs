//! Bounded retry with exponential backoff for transient storage errors.

use std::future::Future;
use std::time::Duration;

use crate::error::ScannerError;

/// SQLite primary result codes for contention.
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

/// PostgreSQL SQLSTATEs worth retrying: serialization failure, deadlock,
/// lock not available, too many connections, cannot connect now.
const PG_TRANSIENT_STATES: [&str; 5] = ["40001", "40P01", "55P03", "53300", "57P03"];

/// How often and how patiently a batch is retried.
///
/// Attempt `n` (1-based) that fails transiently sleeps
/// `initial_backoff * 2^(n-1)`, capped at `max_backoff`, before attempt
/// `n + 1`. After `max_attempts` the last error is returned as
/// [`ScannerError::RetriesExhausted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. At least 1.
    pub max_attempts: u32,
    /// Sleep after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound for any single sleep.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Sleep before the attempt after `attempt` failed.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Runs `op` until it succeeds, fails permanently, or runs out of
    /// attempts.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Persistence`] for a non-transient error and
    /// [`ScannerError::RetriesExhausted`] once every attempt failed
    /// transiently.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, ScannerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !is_transient(&err) => return Err(ScannerError::Persistence(err)),
                Err(err) if attempt >= max_attempts => {
                    tracing::error!(what, attempt, error = %err, "storage still busy, giving up");
                    return Err(ScannerError::RetriesExhausted {
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(what, attempt, ?delay, error = %err, "transient storage error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Returns `true` if retrying the same statement may succeed.
#[must_use]
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db) => {
            let Some(code) = db.code() else {
                return false;
            };
            if db.try_downcast_ref::<sqlx::sqlite::SqliteError>().is_some() {
                // Extended codes keep the primary code in the low byte.
                code.parse::<i64>()
                    .is_ok_and(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
            } else {
                PG_TRANSIENT_STATES.contains(&code.as_ref())
            }
        }
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(300),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(50));
        assert_eq!(policy.backoff(2), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(300));
        assert_eq!(policy.backoff(40), Duration::from_millis(300));
    }

    #[test]
    fn classifies_pool_timeouts_as_transient() {
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
        assert!(!is_transient(&sqlx::Error::RowNotFound));
        assert!(!is_transient(&sqlx::Error::Protocol("bad".to_string())));
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast_policy(5)
            .run("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(sqlx::Error::PoolTimedOut)
                } else {
                    Ok(7)
                }
            })
            .await;
        tokio_test::assert_ok!(&result);
        assert!(matches!(result, Ok(7)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast_policy(3)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(sqlx::Error::PoolTimedOut)
            })
            .await;
        let Err(ScannerError::RetriesExhausted { attempts, .. }) = result else {
            panic!("expected exhausted retries");
        };
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast_policy(5)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(sqlx::Error::RowNotFound)
            })
            .await;
        assert!(matches!(result, Err(ScannerError::Persistence(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
