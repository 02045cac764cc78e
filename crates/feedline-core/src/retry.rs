//! Retry with exponential backoff for sink adapters

use std::time::Duration;

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Backoff schedule: `base * 2^attempt` (2s, 4s, 8s, ... with a 1s base)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max_retries: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max_retries: 3,
        }
    }
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Retry a fallible operation with exponential backoff.
///
/// Returns `Ok(T)` on first success, or the final `Err` on exhaustion /
/// non-retryable error.
pub fn retry_with_backoff<T, E>(
    label: &str,
    backoff: Backoff,
    mut attempt_fn: impl FnMut() -> Result<T, E>,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
{
    let max_retries = backoff.max_retries;
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                attempt += 1;
                log::warn!("{label}: attempt {attempt}/{max_retries} failed: {e}, retrying...");
                std::thread::sleep(backoff.delay(attempt));
            }
            Err(e) => {
                log::error!("{label}: failed permanently: {e}");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (retryable: {})", self.retryable)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn instant(max_retries: u32) -> Backoff {
        Backoff {
            base: Duration::ZERO,
            max_retries,
        }
    }

    #[test]
    fn backoff_exponential() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut calls = 0;
        let result = retry_with_backoff("test", instant(3), || {
            calls += 1;
            if calls < 3 {
                Err(TestError { retryable: true })
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let mut calls = 0;
        let result: Result<(), _> = retry_with_backoff("test", instant(2), || {
            calls += 1;
            Err(TestError { retryable: true })
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn non_retryable_fails_immediately() {
        let mut calls = 0;
        let result: Result<(), _> = retry_with_backoff("test", instant(5), || {
            calls += 1;
            Err(TestError { retryable: false })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
