//! Retry state for the two legs.
//!
//! Leg 1 backs off linearly with its consecutive failure count and resets
//! on the next success. Leg 2 ramps linearly per attempt and wraps back to
//! zero after `reset_after` attempts, so it never stops retrying.

use std::time::Duration;

/// Consecutive leg-1 execution failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Leg1Backoff {
    failures: u32,
}

impl Leg1Backoff {
    pub fn with_failures(failures: u32) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
    }

    /// Wait before the next outer-loop iteration.
    pub fn wait(&self, base: Duration) -> Duration {
        base.saturating_mul(self.failures)
    }
}

/// Rotating attempt index for the leg-2 retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg2Backoff {
    attempt: u32,
    reset_after: u32,
}

impl Leg2Backoff {
    pub fn new(reset_after: u32) -> Self {
        Self::with_attempt(0, reset_after)
    }

    pub fn with_attempt(attempt: u32, reset_after: u32) -> Self {
        let reset_after = reset_after.max(1);
        Self {
            attempt: attempt % reset_after,
            reset_after,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Wait for the current attempt, then advance the index.
    pub fn next_wait(&mut self, base: Duration) -> Duration {
        let wait = base.saturating_mul(self.attempt);
        self.attempt += 1;
        if self.attempt >= self.reset_after {
            self.attempt = 0;
        }
        wait
    }
}
