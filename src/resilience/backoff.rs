//! Delay between retry attempts, fixed or exponential, with optional jitter.

use rand::Rng;
use std::time::Duration;

/// Pause schedule used by the retry executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same pause after every failed attempt.
    Fixed { delay: Duration, jitter: bool },
    /// `initial * multiplier^(n-1)` after the n-th failed attempt, capped at `max`.
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Backoff {
    pub fn fixed(delay: Duration) -> Self {
        Backoff::Fixed { delay, jitter: false }
    }

    pub fn exponential(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Backoff::Exponential {
            initial,
            multiplier,
            max,
            jitter: false,
        }
    }

    /// Enable 0-10% random extra delay.
    pub fn with_jitter(self) -> Self {
        match self {
            Backoff::Fixed { delay, .. } => Backoff::Fixed { delay, jitter: true },
            Backoff::Exponential {
                initial,
                multiplier,
                max,
                ..
            } => Backoff::Exponential {
                initial,
                multiplier,
                max,
                jitter: true,
            },
        }
    }

    /// Pause after the given failed attempt (1-based). Attempt 0 never waits.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.has_jitter() {
            apply_jitter(base)
        } else {
            base
        }
    }

    /// Longest pause `delay(attempt)` can return.
    pub fn max_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.has_jitter() {
            base + Duration::from_millis(base.as_millis() as u64 / 10)
        } else {
            base
        }
    }

    fn has_jitter(&self) -> bool {
        match self {
            Backoff::Fixed { jitter, .. } | Backoff::Exponential { jitter, .. } => *jitter,
        }
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        match self {
            Backoff::Fixed { delay, .. } => *delay,
            Backoff::Exponential {
                initial,
                multiplier,
                max,
                ..
            } => {
                let factor = multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
                let millis = (initial.as_millis() as f64 * factor).min(max.as_millis() as f64);
                Duration::from_millis(millis as u64)
            }
        }
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    let delay_ms = delay.as_millis() as u64;
    let jitter_range = delay_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(delay_ms + jitter)
}
