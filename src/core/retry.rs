//! Bounded-attempt retry with exponential backoff.
//!
//! Retry is a pure function of (error class, attempts made), so retry
//! behavior is testable without clocks or I/O.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Coarse failure classification driving retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying: timeouts, rate limits, server errors
    Transient,

    /// Not worth retrying: invalid input, policy rejections
    Permanent,
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Wait `delay`, then try again
    Retry { delay: Duration },

    /// Stop trying
    GiveUp,
}

/// Retry policy for transient failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt (0 = never retry)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Delay ceiling, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Decide the next step after `attempt` completed attempts (1-indexed)
    pub fn next_step(&self, class: ErrorClass, attempt: u32) -> RetryStep {
        match class {
            ErrorClass::Permanent => RetryStep::GiveUp,
            ErrorClass::Transient if attempt <= self.max_retries => RetryStep::Retry {
                delay: self.delay_for_attempt(attempt),
            },
            ErrorClass::Transient => RetryStep::GiveUp,
        }
    }

    /// Backoff delay before the retry following attempt `attempt`:
    /// base × 2^(attempt-1), capped at `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let delay = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}
