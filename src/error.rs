//! Error taxonomy (§7) and log-flood protection.
//!
//! Most of the taxonomy in §7 is *not* modeled as `Result`/`Err` — kernel-bug and
//! client-bug conditions are rate-limited log lines with the offending event dropped,
//! and configuration errors return a typed status code rather than failing. Only the
//! "library-bug"/"system error" classes that indicate genuine internal corruption use
//! [`CoreError`].

use crate::time::Micros;

/// Structural failures that indicate a programming error by the host or this crate,
/// not a malformed kernel event (those are logged and dropped, never returned as an
/// error — see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A `DeviceId` was used after its device was removed or never existed.
    #[error("unknown device id")]
    UnknownDevice,
    /// A seat slot operation referenced a slot index outside the seat's bitset width.
    #[error("seat slot index out of range")]
    SlotOutOfRange,
    /// A dispatch operation was invoked on a device suspended or torn down.
    #[error("device is not active")]
    DeviceNotActive,
}

/// Typed result of a configuration setter (§7 "Configuration errors").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    /// The value was accepted and applied.
    Success,
    /// This device does not support the option at all.
    Unsupported,
    /// The option is supported but the value was out of range.
    Invalid,
}

impl ConfigStatus {
    /// True if the value was applied.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A token-bucket rate limiter protecting a single log call site (§5 "Rate-limiters").
///
/// Grounded on `original_source/src/libinput-util.c`'s ratelimit helper: `burst`
/// tokens are available up front, one is consumed per call, and the bucket refills
/// fully after `interval_us` has elapsed since the last refill.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    interval_us: u64,
    burst: u32,
    tokens: u32,
    window_start: Option<Micros>,
}

/// Outcome of a single [`RateLimiter::check`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Under the burst limit for this window: proceed (e.g. log the message).
    Pass,
    /// Over the burst limit: the caller should suppress this occurrence.
    Suppress,
    /// This call refilled the bucket after a prior suppression; callers typically log
    /// a "N messages suppressed" notice in addition to the current message.
    PassAfterSuppression,
}

impl RateLimiter {
    /// Build a limiter allowing `burst` events per `interval_us` microseconds.
    #[must_use]
    pub fn new(interval_us: u64, burst: u32) -> Self {
        Self {
            interval_us,
            burst,
            tokens: burst,
            window_start: None,
        }
    }

    /// Check whether an event at `now` should be let through.
    pub fn check(&mut self, now: Micros) -> RateLimitDecision {
        let was_suppressed = self.tokens == 0;
        match self.window_start {
            None => {
                self.window_start = Some(now);
            }
            Some(start) if now.since(start) >= self.interval_us => {
                self.window_start = Some(now);
                self.tokens = self.burst;
            }
            Some(_) => {}
        }

        if self.tokens == 0 {
            return RateLimitDecision::Suppress;
        }
        self.tokens -= 1;
        if was_suppressed {
            RateLimitDecision::PassAfterSuppression
        } else {
            RateLimitDecision::Pass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_burst_then_suppresses() {
        let mut limiter = RateLimiter::new(1_000_000, 2);
        assert_eq!(limiter.check(Micros(0)), RateLimitDecision::Pass);
        assert_eq!(limiter.check(Micros(1)), RateLimitDecision::Pass);
        assert_eq!(limiter.check(Micros(2)), RateLimitDecision::Suppress);
    }

    #[test]
    fn refills_after_interval() {
        let mut limiter = RateLimiter::new(1_000, 1);
        assert_eq!(limiter.check(Micros(0)), RateLimitDecision::Pass);
        assert_eq!(limiter.check(Micros(100)), RateLimitDecision::Suppress);
        assert_eq!(
            limiter.check(Micros(2_000)),
            RateLimitDecision::PassAfterSuppression
        );
    }

    #[test]
    fn config_status_is_success_helper() {
        assert!(ConfigStatus::Success.is_success());
        assert!(!ConfigStatus::Invalid.is_success());
    }
}
