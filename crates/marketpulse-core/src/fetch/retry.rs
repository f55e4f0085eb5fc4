use std::thread;
use std::time::Duration;

use tracing::warn;

use super::FetchError;

/// Single-retry policy: one extra attempt after a fixed pause, and only for
/// retryable failures. Rate limiting is always surfaced immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOnce {
    pub pause: Duration,
}

impl Default for RetryOnce {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(1),
        }
    }
}

impl RetryOnce {
    pub fn new(pause: Duration) -> Self {
        Self { pause }
    }

    pub fn run<T>(
        &self,
        mut attempt: impl FnMut() -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        match attempt() {
            Ok(value) => Ok(value),
            Err(err) if err.retryable() => {
                warn!(error = %err, "fetch attempt failed, retrying once");
                thread::sleep(self.pause);
                attempt()
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(retryable: bool) -> FetchError {
        FetchError::Transport {
            message: "boom".into(),
            retryable,
        }
    }

    #[test]
    fn retries_exactly_once_on_retryable_failure() {
        let mut calls = 0;
        let result: Result<u32, _> = RetryOnce::new(Duration::ZERO).run(|| {
            calls += 1;
            Err(transport(true))
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn second_attempt_can_succeed() {
        let mut calls = 0;
        let result = RetryOnce::new(Duration::ZERO).run(|| {
            calls += 1;
            if calls == 1 {
                Err(transport(true))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls, 2);
    }

    #[test]
    fn never_retries_rate_limiting() {
        let mut calls = 0;
        let result: Result<(), _> = RetryOnce::new(Duration::ZERO).run(|| {
            calls += 1;
            Err(FetchError::RateLimited("quota".into()))
        });
        assert!(matches!(result, Err(FetchError::RateLimited(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn does_not_retry_non_retryable_transport() {
        let mut calls = 0;
        let _: Result<(), _> = RetryOnce::new(Duration::ZERO).run(|| {
            calls += 1;
            Err(transport(false))
        });
        assert_eq!(calls, 1);
    }
}
