//! Backoff curves for the two retry tiers.
//!
//! Two curves because the tiers have different cost/risk profiles: the page
//! tier waits between *content-quality* retries, where the call itself
//! succeeded but the content was bad, so it backs off long enough for the
//! API to produce a materially different sampling draw. The transport tier
//! waits between *infrastructure* retries (429/5xx/timeouts), where quick
//! recovery is the norm, so its ceiling is much lower.
//!
//! Both curves carry randomized jitter so pages processed in sequence never
//! fall into lock-step retry storms against the same endpoint.

use std::time::Duration;

/// Exponential backoff curve with a ceiling and uniform jitter.
///
/// `delay_for_attempt(n)` computes `min(ceiling, initial · multiplierⁿ)`
/// plus a uniform draw from `[jitter_min, jitter_max)`. Deterministic
/// modulo the jitter; monotonically non-decreasing up to the ceiling.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry (attempt index 0).
    pub initial: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Upper bound on the un-jittered delay.
    pub ceiling: Duration,
    /// Lower bound of the uniform jitter added to every delay.
    pub jitter_min: Duration,
    /// Upper bound of the uniform jitter.
    pub jitter_max: Duration,
}

impl BackoffPolicy {
    /// Page-tier curve: `min(180s, 12s · 1.5ⁿ) + uniform(0, 2s)`.
    pub fn page() -> Self {
        Self {
            initial: Duration::from_secs(12),
            multiplier: 1.5,
            ceiling: Duration::from_secs(180),
            jitter_min: Duration::ZERO,
            jitter_max: Duration::from_secs(2),
        }
    }

    /// Transport-tier curve: `min(60s, 4s · 1.6ⁿ) + uniform(250ms, 750ms)`.
    pub fn transport() -> Self {
        Self {
            initial: Duration::from_secs(4),
            multiplier: 1.6,
            ceiling: Duration::from_secs(60),
            jitter_min: Duration::from_millis(250),
            jitter_max: Duration::from_millis(750),
        }
    }

    /// The delay to wait before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.ceiling.as_secs_f64());

        let span = self
            .jitter_max
            .saturating_sub(self.jitter_min)
            .as_secs_f64();
        let jitter = self.jitter_min.as_secs_f64() + fastrand::f64() * span;

        Duration::from_secs_f64(capped + jitter)
    }

    /// Copy of this policy with jitter removed, for deterministic tests.
    pub fn without_jitter(mut self) -> Self {
        self.jitter_min = Duration::ZERO;
        self.jitter_max = Duration::ZERO;
        self
    }
}
