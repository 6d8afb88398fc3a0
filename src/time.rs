//! Monotonic time in microseconds, the unit every evdev timestamp in this crate uses.

use std::ops::{Add, Sub};

/// A monotonic timestamp in microseconds, as delivered by the evdev-reader collaborator.
///
/// Never wraps a wall-clock time; only ever compared against other `Micros` from the
/// same clock source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Micros(pub u64);

impl Micros {
    /// Zero time, used as a sentinel for "never happened yet".
    pub const ZERO: Self = Self(0);

    /// Milliseconds to microseconds.
    #[must_use]
    pub const fn from_ms(ms: u64) -> Self {
        Self(ms * 1_000)
    }

    /// Saturating duration since an earlier timestamp, in microseconds.
    #[must_use]
    pub fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// True if at least `ms` milliseconds have passed since `earlier`.
    #[must_use]
    pub fn elapsed_ms(self, earlier: Self, ms: u64) -> bool {
        self.since(earlier) >= ms * 1_000
    }
}

impl Add<u64> for Micros {
    type Output = Self;
    fn add(self, rhs: u64) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub<u64> for Micros {
    type Output = Self;
    fn sub(self, rhs: u64) -> Self {
        Self(self.0.saturating_sub(rhs))
    }
}
