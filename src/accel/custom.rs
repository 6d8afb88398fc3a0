//! Custom piecewise-linear acceleration profile (§4.2): a user-supplied curve through
//! up to 32 `(speed, factor)` points, speed in `[0, 50_000]`.
//!
//! Grounded on `original_source/src/filter-custom.c`'s point-list interpolation.

use super::AccelProfile;

/// Maximum number of control points a custom curve may hold.
pub const MAX_POINTS: usize = 32;
/// Valid range for a control point's speed component, in device units/ms.
pub const MAX_SPEED: f64 = 50_000.0;

/// One `(speed, factor)` control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Speed in device units/ms, within `[0, MAX_SPEED]`.
    pub speed: f64,
    /// Acceleration factor at this speed.
    pub factor: f64,
}

/// Errors building a [`CustomProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CustomProfileError {
    /// More than [`MAX_POINTS`] points were supplied.
    #[error("custom accel curve has too many points (max {MAX_POINTS})")]
    TooManyPoints,
    /// A point's speed fell outside `[0, MAX_SPEED]`.
    #[error("custom accel curve point speed out of range [0, {MAX_SPEED}]")]
    SpeedOutOfRange,
    /// Points were not supplied in non-decreasing speed order.
    #[error("custom accel curve points must be sorted by non-decreasing speed")]
    NotSorted,
}

/// Custom piecewise-linear curve (§4.2 "Custom").
#[derive(Debug, Clone)]
pub struct CustomProfile {
    points: Vec<Point>,
}

impl CustomProfile {
    /// Build a curve from control points, sorted by non-decreasing speed.
    pub fn new(points: Vec<Point>) -> Result<Self, CustomProfileError> {
        if points.len() > MAX_POINTS {
            return Err(CustomProfileError::TooManyPoints);
        }
        if points
            .iter()
            .any(|p| !(0.0..=MAX_SPEED).contains(&p.speed))
        {
            return Err(CustomProfileError::SpeedOutOfRange);
        }
        if points.windows(2).any(|w| w[0].speed > w[1].speed) {
            return Err(CustomProfileError::NotSorted);
        }
        Ok(Self { points })
    }

    fn interpolate(&self, speed_per_ms: f64) -> f64 {
        let Some(first) = self.points.first() else {
            return 1.0;
        };
        if speed_per_ms <= first.speed {
            return first.factor;
        }
        let last = self.points.last().expect("checked non-empty above");
        if speed_per_ms >= last.speed {
            return last.factor;
        }

        for window in self.points.windows(2) {
            let (lo, hi) = (window[0], window[1]);
            if (lo.speed..=hi.speed).contains(&speed_per_ms) {
                if (hi.speed - lo.speed).abs() < f64::EPSILON {
                    return hi.factor;
                }
                let t = (speed_per_ms - lo.speed) / (hi.speed - lo.speed);
                return lo.factor + t * (hi.factor - lo.factor);
            }
        }
        last.factor
    }
}

impl AccelProfile for CustomProfile {
    fn factor_at(&self, speed_units_per_us: f64) -> f64 {
        self.interpolate(speed_units_per_us * 1_000.0)
    }
}
