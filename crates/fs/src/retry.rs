// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Retry Policy
//!
//! Bounded exponential backoff with full jitter around transient I/O.
//! Logical errors (`ElementNotFoundError`, `WriteConflictError`, ...) are
//! never retried; the transient classification lives on
//! [`codehem_core::Error::is_transient`].

use codehem_core::{Error, Result};
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Per-operation deadline; expiry while retrying raises `TimeoutError`.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
            deadline: None,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Run `operation`, retrying transient failures with backoff.
    pub fn run<T>(&self, name: &str, mut operation: impl FnMut() -> Result<T>) -> Result<T> {
        let started = Instant::now();
        let mut attempt = 0u32;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt + 1 < self.max_attempts => {
                    if let Some(deadline) = self.deadline {
                        if started.elapsed() >= deadline {
                            return Err(Error::Timeout {
                                operation: name.to_string().into(),
                                elapsed: started.elapsed(),
                            });
                        }
                    }
                    let exponential = self
                        .base_delay
                        .saturating_mul(2u32.saturating_pow(attempt))
                        .min(self.max_delay);
                    // Full jitter keeps concurrent retries from herding.
                    let factor: f64 = rand::rng().random_range(0.5..=1.0);
                    let sleep = exponential.mul_f64(factor);
                    debug!(operation = name, attempt, ?sleep, "transient failure, backing off");
                    std::thread::sleep(sleep);
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> Error {
        Error::io(
            "testing",
            std::io::Error::new(std::io::ErrorKind::Interrupted, "eintr"),
        )
    }

    #[test]
    fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let result = policy.run("flaky", || {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let result: Result<()> = policy.run("always-flaky", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        });
        assert_eq!(result.unwrap_err().kind(), "IOError");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn logical_errors_are_never_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let result: Result<()> = policy.run("logical", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::not_found("C.f"))
        });
        assert_eq!(result.unwrap_err().kind(), "ElementNotFoundError");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deadline_expiry_raises_timeout() {
        let policy = RetryPolicy {
            max_attempts: 100,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(5),
            deadline: Some(Duration::from_millis(1)),
        };
        std::thread::sleep(Duration::from_millis(2));
        let result: Result<()> = policy.run("deadline", || Err(transient()));
        assert_eq!(result.unwrap_err().kind(), "TimeoutError");
    }
}
