//! Bounded retry with exponential backoff
//!
//! Every read of eventually-consistent GitHub state that follows a write goes
//! through [`with_retry`]. Sleeping is delegated to a [`Clock`] so tests can
//! record the schedule instead of waiting it out.

use crate::progress::ProgressCallback;
use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Source of sleeps for the retry loop
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real-time clock backed by tokio
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay the exponential schedule starts from
    pub base_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Sleep before the first attempt too (polling), not only between attempts
    pub delay_first_attempt: bool,
}

impl RetryPolicy {
    /// Polling for a PR after `gt submit`: sleeps 0.5, 1, 2, 4, 8 seconds
    /// before each of five lookups.
    pub const fn pr_visibility() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            delay_first_attempt: true,
        }
    }

    /// Waiting for GitHub to compute mergeability after a base change
    pub const fn mergeability() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            delay_first_attempt: false,
        }
    }

    /// Reading and correcting a PR base before merging
    pub const fn base_update() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            delay_first_attempt: false,
        }
    }

    /// Delay before the given 1-based attempt, if any
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        let exponent = if self.delay_first_attempt {
            attempt.checked_sub(1)?
        } else {
            attempt.checked_sub(2)?
        };
        let exponent = i32::try_from(exponent).unwrap_or(i32::MAX);
        Some(self.base_delay.mul_f64(self.backoff_factor.powi(exponent)))
    }

    /// Every sleep the policy performs when all attempts fail
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_attempts)
            .filter_map(|attempt| self.delay_before(attempt))
            .collect()
    }
}

/// Outcome of a single failed attempt
#[derive(Debug)]
pub enum Attempt<E> {
    /// Worth retrying (state still converging)
    Transient(E),
    /// Retrying cannot help
    Permanent(E),
}

/// Run `operation` under `policy`.
///
/// `operation` receives the 1-based attempt number. A permanent failure is
/// returned at once; after the last transient failure, that error is returned
/// unchanged.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    progress: &dyn ProgressCallback,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        if let Some(delay) = policy.delay_before(attempt) {
            progress
                .on_message(&format!(
                    "{label}: waiting {:.1}s (attempt {attempt}/{max_attempts})",
                    delay.as_secs_f64()
                ))
                .await;
            clock.sleep(delay).await;
        } else {
            progress
                .on_message(&format!("{label} (attempt {attempt}/{max_attempts})"))
                .await;
        }

        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(Attempt::Permanent(err)) => {
                debug!(label, attempt, %err, "permanent failure");
                return Err(err);
            }
            Err(Attempt::Transient(err)) => {
                debug!(label, attempt, %err, "transient failure");
                if attempt >= max_attempts {
                    return Err(err);
                }
                attempt += 1;
            }
        }
    }
}
