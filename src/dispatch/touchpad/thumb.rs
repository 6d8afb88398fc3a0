//! Thumb detection (§4.8.4): two independent algorithms, selected per-device, that
//! never un-set once a touch is flagged a thumb.
//!
//! Grounded on `original_source/src/evdev-mt-touchpad-thumb.c`'s `tp_thumb_detect`,
//! which the original keeps as two separate code paths rather than merging them —
//! mirrored here as two free functions behind [`ThumbAlgorithm`] rather than one
//! function with a branch, since each has a materially different state shape.

use crate::geom::PhysicalCoords;
use crate::time::Micros;

/// Fraction of touchpad height where the upper thumb stripe begins (§4.8.4).
pub const UPPER_THUMB_LINE_FRACTION: f64 = 0.85;
/// Fraction of touchpad height where the lower thumb stripe begins (§4.8.4).
pub const LOWER_THUMB_LINE_FRACTION: f64 = 0.92;
/// Minimum clickpad height for thumb detection to be enabled at all (§4.8.4).
pub const MIN_CLICKPAD_HEIGHT_MM: f64 = 50.0;
/// Dwell time below the lower line, with edge-scroll disabled, that flags a thumb.
const LINGER_MS: u64 = 300;
/// Speed threshold for the two-finger-descent heuristic.
const FAST_DESCENT_MM_PER_S: f64 = 20.0;
/// Consecutive frames the first touch must exceed the speed threshold.
const FAST_DESCENT_FRAMES: u32 = 5;
/// Horizontal landing tolerance that still counts as an intentional two-finger scroll.
const LANDING_TOLERANCE_X_MM: f64 = 25.0;
/// Vertical landing tolerance for the same heuristic.
const LANDING_TOLERANCE_Y_MM: f64 = 15.0;

/// Per-touch thumb classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbState {
    /// Not yet decided.
    Maybe,
    /// Confirmed a thumb; never reverts.
    Yes,
    /// Confirmed not a thumb for this touch's lifetime.
    No,
}

/// Which thumb-detection algorithm a device uses (§9 Open Questions: kept as two
/// distinct functions behind a config switch rather than merged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbAlgorithm {
    /// Pressure/dwell based, evaluated independently per touch.
    Multifinger,
    /// Two-finger-descent speed heuristic.
    WhileMoving,
}

/// Multifinger algorithm: a touch in the lower exclusion band with pressure over
/// threshold, or one that lingers there with edge-scroll off.
#[derive(Debug, Clone)]
pub struct MultifingerDetector {
    state: ThumbState,
    entered_lower_band_at: Option<Micros>,
}

impl MultifingerDetector {
    /// A fresh, undecided detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ThumbState::Maybe,
            entered_lower_band_at: None,
        }
    }

    /// Current classification.
    #[must_use]
    pub fn state(&self) -> ThumbState {
        self.state
    }

    /// Evaluate one frame. `y_fraction` is the touch's y position as a fraction of
    /// pad height; `pressure`/`pressure_threshold` are device-calibrated units.
    pub fn evaluate(
        &mut self,
        time: Micros,
        y_fraction: f64,
        pressure: f64,
        pressure_threshold: f64,
        edge_scroll_enabled: bool,
    ) {
        if self.state != ThumbState::Maybe {
            return;
        }
        let in_lower_band = y_fraction >= LOWER_THUMB_LINE_FRACTION;
        if !in_lower_band {
            self.entered_lower_band_at = None;
            return;
        }
        if pressure > pressure_threshold {
            self.state = ThumbState::Yes;
            return;
        }
        if edge_scroll_enabled {
            return;
        }
        let entered_at = *self.entered_lower_band_at.get_or_insert(time);
        if time.elapsed_ms(entered_at, LINGER_MS) {
            self.state = ThumbState::Yes;
        }
    }
}

impl Default for MultifingerDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// While-moving algorithm: tracks whether the first touch is descending fast, then
/// classifies a newly landed second touch based on its landing offset.
#[derive(Debug, Clone, Default)]
pub struct WhileMovingDetector {
    fast_frames: u32,
}

impl WhileMovingDetector {
    /// A fresh detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame's speed for the original (first) touch, in mm/s.
    pub fn feed_first_touch_speed(&mut self, speed_mm_per_s: f64) {
        if speed_mm_per_s > FAST_DESCENT_MM_PER_S {
            self.fast_frames += 1;
        } else {
            self.fast_frames = 0;
        }
    }

    /// True if the first touch has sustained a fast descent long enough to arm the
    /// heuristic for the next landing touch.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.fast_frames > FAST_DESCENT_FRAMES
    }

    /// Classify a newly-landed second touch given its offset from the first touch, in
    /// mm. Returns `Yes` unless the landing falls within the two-finger-scroll
    /// tolerance box.
    #[must_use]
    pub fn classify_landing(&self, offset: PhysicalCoords) -> ThumbState {
        if !self.is_armed() {
            return ThumbState::Maybe;
        }
        if offset.x.abs() <= LANDING_TOLERANCE_X_MM && offset.y.abs() <= LANDING_TOLERANCE_Y_MM {
            ThumbState::No
        } else {
            ThumbState::Yes
        }
    }
}

/// True if thumb detection should be active at all for this device (§4.8.4: "Only
/// enabled on clickpads ≥ 50 mm tall").
#[must_use]
pub fn is_enabled_for(is_clickpad: bool, height_mm: f64) -> bool {
    is_clickpad && height_mm >= MIN_CLICKPAD_HEIGHT_MM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_pressure_in_lower_band_is_immediate_thumb() {
        let mut detector = MultifingerDetector::new();
        detector.evaluate(Micros(0), 0.95, 10.0, 5.0, false);
        assert_eq!(detector.state(), ThumbState::Yes);
    }

    #[test]
    fn lingering_below_line_with_edge_scroll_off_becomes_thumb() {
        let mut detector = MultifingerDetector::new();
        detector.evaluate(Micros(0), 0.95, 1.0, 5.0, false);
        assert_eq!(detector.state(), ThumbState::Maybe);
        detector.evaluate(Micros::from_ms(301), 0.95, 1.0, 5.0, false);
        assert_eq!(detector.state(), ThumbState::Yes);
    }

    #[test]
    fn lingering_with_edge_scroll_enabled_never_flags() {
        let mut detector = MultifingerDetector::new();
        detector.evaluate(Micros(0), 0.95, 1.0, 5.0, true);
        detector.evaluate(Micros::from_ms(500), 0.95, 1.0, 5.0, true);
        assert_eq!(detector.state(), ThumbState::Maybe);
    }

    #[test]
    fn fast_descent_arms_after_enough_frames() {
        let mut detector = WhileMovingDetector::new();
        for _ in 0..6 {
            detector.feed_first_touch_speed(30.0);
        }
        assert!(detector.is_armed());
    }

    #[test]
    fn landing_within_tolerance_is_not_a_thumb() {
        let mut detector = WhileMovingDetector::new();
        for _ in 0..6 {
            detector.feed_first_touch_speed(30.0);
        }
        let offset = PhysicalCoords::new(5.0, 5.0);
        assert_eq!(detector.classify_landing(offset), ThumbState::No);
    }

    #[test]
    fn landing_outside_tolerance_is_a_thumb() {
        let mut detector = WhileMovingDetector::new();
        for _ in 0..6 {
            detector.feed_first_touch_speed(30.0);
        }
        let offset = PhysicalCoords::new(40.0, 5.0);
        assert_eq!(detector.classify_landing(offset), ThumbState::Yes);
    }

    #[test]
    fn thumb_detection_disabled_on_short_pads() {
        assert!(!is_enabled_for(true, 40.0));
        assert!(is_enabled_for(true, 60.0));
    }
}
