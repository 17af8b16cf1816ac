//! Bounded exponential-backoff retry for store operations.

use std::thread;
use std::time::Duration;

use crate::models::CoreResult;

/// Delay before retry `n` (0-based) is `base_delay * 2^n`. Only errors whose
/// kind is retryable are retried; anything else is returned on first sight.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Same backoff, different attempt cap.
    pub fn capped(self, attempts: u32) -> Self {
        Self::new(attempts.min(self.attempts).max(1), self.base_delay)
    }

    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    pub fn run<T>(
        &self,
        operation_name: &'static str,
        mut operation: impl FnMut() -> CoreResult<T>,
    ) -> CoreResult<T> {
        self.run_with_sleep(operation_name, &mut operation, thread::sleep)
    }

    fn run_with_sleep<T>(
        &self,
        operation_name: &'static str,
        operation: &mut impl FnMut() -> CoreResult<T>,
        mut sleep: impl FnMut(Duration),
    ) -> CoreResult<T> {
        let attempts = self.attempts.max(1);
        let mut attempt = 0;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        "transient store error: {error}"
                    );
                    if attempt >= attempts {
                        tracing::error!(
                            operation = operation_name,
                            "giving up after {attempts} attempts: {error}"
                        );
                        return Err(error);
                    }
                    sleep(delay);
                }
                Err(error) => {
                    tracing::error!(operation = operation_name, "store error (no retry): {error}");
                    return Err(error);
                }
            }
        }
    }
}
