//! Touchpad acceleration profile (§4.2): the mouse linear curve scaled by the 0.37
//! "slowdown" magic factor.
//!
//! Grounded on `original_source/src/filter.c`'s `TP_MAGIC_SLOWDOWN` constant: "Once
//! normalized, touchpads see the same acceleration as mice. That is technically
//! correct but subjectively wrong, we expect a touchpad to be a lot slower."

use super::linear::LinearProfile;
use super::AccelProfile;

/// Slowdown applied uniformly on top of the linear mouse curve.
pub const SLOWDOWN: f64 = 0.37;

/// Touchpad acceleration profile: `linear(speed) * 0.37`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchpadProfile {
    inner: LinearProfile,
}

impl TouchpadProfile {
    /// Build the default touchpad profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust the curve by a speed knob in `[-1, 1]`.
    pub fn set_speed(&mut self, adjustment: f64) -> bool {
        self.inner.set_speed(adjustment)
    }
}

impl AccelProfile for TouchpadProfile {
    fn factor_at(&self, speed: f64) -> f64 {
        self.inner.factor_at(speed) * SLOWDOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_down_linear_curve() {
        let profile = TouchpadProfile::new();
        let linear = LinearProfile::default();
        let speed = 0.2 / 1_000.0;
        assert!((profile.factor_at(speed) - linear.factor_at(speed) * SLOWDOWN).abs() < 1e-9);
    }
}
