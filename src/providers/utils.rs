// ABOUTME: Bounded retry policy with exponential backoff and uniform jitter
// ABOUTME: Applied by the engine around transport-level failures only
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Retry policy for transport failures.
//!
//! Retries run as a bounded loop with jittered exponential delay, never
//! recursion, keeping stack depth and cancellation behavior predictable. Auth,
//! parse, and crypto failures are never retried within a cycle.

use rand::Rng;
use std::time::Duration;

/// Configuration for the bounded transport-retry loop
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first (so 3 means two retries)
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay in milliseconds
    pub max_backoff_ms: u64,
    /// Fraction of the base delay added as uniform random jitter (0.0 disables)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    /// Delay to sleep after the given failed attempt (1-based).
    ///
    /// Doubles per attempt from `initial_backoff_ms`, capped at
    /// `max_backoff_ms`, with up to `jitter_factor` of the base added on top.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self
            .initial_backoff_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.max_backoff_ms);

        let jitter = if self.jitter_factor > 0.0 {
            rand::thread_rng().gen_range(0.0..self.jitter_factor)
        } else {
            0.0
        };

        Duration::from_millis((base as f64 * (1.0 + jitter)) as u64)
    }
}
