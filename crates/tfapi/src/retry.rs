//! Bounded retry with a fixed inter-attempt delay.
//!
//! Every invocation gets a fresh retry budget; there is no cross-call
//! backoff memory and no circuit breaking. An operation that keeps failing
//! surfaces its last error unchanged, so the remote diagnostics (status,
//! body) stay intact for the caller.

use crate::error::Result;
use std::thread;
use std::time::Duration;

/// How often and how patiently a remote call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (not additional retries).
    pub retries: u32,
    /// Fixed delay between attempts.
    pub sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            sleep: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy from attempt count and sleep seconds.
    pub fn new(retries: u32, sleep_secs: u64) -> Self {
        Self {
            retries: retries.max(1),
            sleep: Duration::from_secs(sleep_secs),
        }
    }

    /// A policy that gives up after the first attempt.
    pub fn no_retry() -> Self {
        Self {
            retries: 1,
            sleep: Duration::ZERO,
        }
    }
}

/// Execute `operation` up to `policy.retries` times.
///
/// Any error triggers another attempt after the fixed sleep. Once the
/// budget is exhausted the last error is returned as-is.
pub fn with_retry<T, F>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = policy.retries.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match operation() {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < attempts {
                    log::warn!(
                        "attempt {attempt}/{attempts} failed: {e}; retrying in {}s",
                        policy.sleep.as_secs()
                    );
                    thread::sleep(policy.sleep);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| crate::error::Error::Network {
        message: "retry budget exhausted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;
    use std::time::Instant;

    fn network(msg: &str) -> Error {
        Error::Network {
            message: msg.to_string(),
        }
    }

    #[test]
    fn test_success_first_try() {
        let policy = RetryPolicy::no_retry();
        let result = with_retry(&policy, || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_exhaustion_returns_last_error_after_exact_attempts() {
        let policy = RetryPolicy {
            retries: 3,
            sleep: Duration::from_millis(10),
        };
        let attempts = Cell::new(0u32);

        let started = Instant::now();
        let result: Result<()> = with_retry(&policy, || {
            attempts.set(attempts.get() + 1);
            Err(network(&format!("failure {}", attempts.get())))
        });
        let elapsed = started.elapsed();

        assert_eq!(attempts.get(), 3);
        // Two inter-attempt sleeps for three attempts.
        assert!(elapsed >= Duration::from_millis(20));
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "network error: failure 3");
    }

    #[test]
    fn test_success_after_transient_failure() {
        let policy = RetryPolicy {
            retries: 3,
            sleep: Duration::from_millis(1),
        };
        let attempts = Cell::new(0u32);

        let result = with_retry(&policy, || {
            attempts.set(attempts.get() + 1);
            if attempts.get() < 2 {
                Err(network("timeout"))
            } else {
                Ok("ok")
            }
        });

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_api_errors_are_retried_too() {
        // The retry budget does not discriminate between error kinds.
        let policy = RetryPolicy {
            retries: 2,
            sleep: Duration::from_millis(1),
        };
        let attempts = Cell::new(0u32);

        let result: Result<()> = with_retry(&policy, || {
            attempts.set(attempts.get() + 1);
            Err(Error::Api {
                status: 500,
                message: "boom".to_string(),
            })
        });

        assert_eq!(attempts.get(), 2);
        assert_eq!(result.unwrap_err().status(), Some(500));
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let policy = RetryPolicy::new(0, 0);
        let attempts = Cell::new(0u32);
        let _: Result<()> = with_retry(&policy, || {
            attempts.set(attempts.get() + 1);
            Err(network("nope"))
        });
        assert_eq!(attempts.get(), 1);
    }
}
