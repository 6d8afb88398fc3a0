//! Wobble detection, hysteresis hookup and jump rejection (§4.8.5).

use crate::geom::DeviceCoords;
use crate::hysteresis::{self, Margin};
use crate::time::Micros;

/// A per-frame delta beyond this is a driver jump, not real motion (§4.8.5).
const JUMP_REJECTION_MM: f64 = 20.0;
/// Wobble pattern must complete within this window to trigger hysteresis (§4.8.5).
const WOBBLE_WINDOW_MS: u64 = 40;

/// Sign of a single-axis delta, used for the wobble pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Left,
    Right,
}

fn sign_of(dx: f64) -> Option<Sign> {
    if dx > 0.0 {
        Some(Sign::Right)
    } else if dx < 0.0 {
        Some(Sign::Left)
    } else {
        None
    }
}

/// Per-touch jitter filter state: a 3-entry x-direction history for wobble detection
/// plus the hysteresis filter it may switch on.
#[derive(Debug, Clone)]
pub struct JitterFilter {
    history: [(Sign, Micros); 3],
    history_len: usize,
    hysteresis_enabled: bool,
    margin: Margin,
}

impl JitterFilter {
    /// Build a filter with the given hysteresis margin (from `max(fuzz,
    /// resolution/4)`, §4.8.5).
    #[must_use]
    pub fn new(margin: Margin) -> Self {
        Self {
            history: [(Sign::Left, Micros::ZERO); 3],
            history_len: 0,
            hysteresis_enabled: false,
            margin,
        }
    }

    /// Feed a raw per-frame delta in mm, in x/y. Returns `true` if the frame should be
    /// dropped as a driver jump (§4.8.5 "Jump rejection").
    pub fn is_driver_jump(&self, delta_mm: crate::geom::PhysicalCoords) -> bool {
        delta_mm.hypot() > JUMP_REJECTION_MM
    }

    /// Record this frame's x delta for wobble detection, enabling hysteresis globally
    /// for this touch if the `Right, Left, Right` (or mirrored) pattern completes
    /// within the wobble window.
    pub fn record_and_check_wobble(&mut self, dx: f64, time: Micros) {
        let Some(sign) = sign_of(dx) else {
            return;
        };
        if self.history_len < 3 {
            self.history[self.history_len] = (sign, time);
            self.history_len += 1;
        } else {
            self.history.rotate_left(1);
            self.history[2] = (sign, time);
        }

        if self.history_len == 3 {
            let [a, b, c] = self.history;
            let alternates = a.0 != b.0 && b.0 != c.0 && a.0 == c.0;
            let within_window = c.1.since(a.1) < WOBBLE_WINDOW_MS * 1_000;
            if alternates && within_window {
                self.hysteresis_enabled = true;
            }
        }
    }

    /// True once wobble has been detected for this session.
    #[must_use]
    pub fn hysteresis_enabled(&self) -> bool {
        self.hysteresis_enabled
    }

    /// Apply hysteresis filtering if enabled, otherwise pass the point through
    /// unchanged.
    #[must_use]
    pub fn filter(&self, point: DeviceCoords, center: DeviceCoords) -> DeviceCoords {
        if self.hysteresis_enabled {
            hysteresis::filter(point, center, self.margin)
        } else {
            point
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_left_right_within_window_enables_hysteresis() {
        let mut filter = JitterFilter::new(Margin { a: 1.0, b: 1.0 });
        filter.record_and_check_wobble(1.0, Micros(0));
        filter.record_and_check_wobble(-1.0, Micros(10_000));
        filter.record_and_check_wobble(1.0, Micros(20_000));
        assert!(filter.hysteresis_enabled());
    }

    #[test]
    fn pattern_outside_window_does_not_enable_hysteresis() {
        let mut filter = JitterFilter::new(Margin { a: 1.0, b: 1.0 });
        filter.record_and_check_wobble(1.0, Micros(0));
        filter.record_and_check_wobble(-1.0, Micros(10_000));
        filter.record_and_check_wobble(1.0, Micros(100_000));
        assert!(!filter.hysteresis_enabled());
    }

    #[test]
    fn monotonic_motion_never_enables_hysteresis() {
        let mut filter = JitterFilter::new(Margin { a: 1.0, b: 1.0 });
        filter.record_and_check_wobble(1.0, Micros(0));
        filter.record_and_check_wobble(1.0, Micros(10_000));
        filter.record_and_check_wobble(1.0, Micros(20_000));
        assert!(!filter.hysteresis_enabled());
    }

    #[test]
    fn large_delta_is_flagged_as_driver_jump() {
        let filter = JitterFilter::new(Margin { a: 1.0, b: 1.0 });
        let delta = crate::geom::PhysicalCoords::new(25.0, 0.0);
        assert!(filter.is_driver_jump(delta));
    }
}
