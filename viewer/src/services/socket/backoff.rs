//! Throttle for externally triggered reconnects.
//!
//! Reconnects are driven by the reconnect trigger, never scheduled here. After
//! an attempt fails to establish, triggers that arrive before the backoff
//! window has elapsed are ignored (not queued). The window doubles with every
//! consecutive failure and resets once a transport opens.

use std::time::Duration;

use tokio::time::Instant;

/// Exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Window after the first failure. Zero disables throttling.
    pub initial: Duration,
    /// Cap on the window
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// Never throttle.
    pub fn disabled() -> Self {
        Self {
            initial: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Window after `failures` consecutive failed attempts (1-based).
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures == 0 || self.initial.is_zero() {
            return Duration::ZERO;
        }
        // Capped shift keeps the multiplication from overflowing
        let shift = failures.saturating_sub(1).min(20);
        self.initial
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

/// Consecutive-failure tracker for one connection manager.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    policy: BackoffPolicy,
    failures: u32,
    not_before: Option<Instant>,
}

impl ReconnectBackoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            failures: 0,
            not_before: None,
        }
    }

    /// An attempt closed without ever opening.
    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        let delay = self.policy.delay_for(self.failures);
        self.not_before = (!delay.is_zero()).then(|| Instant::now() + delay);
    }

    /// A transport opened.
    pub fn reset(&mut self) {
        self.failures = 0;
        self.not_before = None;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Time left in the current window, if any.
    pub fn remaining(&self) -> Option<Duration> {
        let not_before = self.not_before?;
        let now = Instant::now();
        (now < not_before).then(|| not_before - now)
    }
}
