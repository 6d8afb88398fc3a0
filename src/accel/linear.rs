//! Linear mouse profile (§4.2): the default "adaptive" curve for mice >=1000 DPI, with
//! a low-DPI variant that rescales the threshold and cap.
//!
//! Grounded on `original_source/src/filter.c`'s `pointer_accel_profile_linear` and its
//! low-dpi counterpart.

use super::AccelProfile;

/// Speed (units/ms) below which the curve is a gentle near-linear ramp.
const LOW_THRESHOLD: f64 = 0.07;
/// Default speed (units/ms) at which the incline segment begins.
const DEFAULT_THRESHOLD: f64 = 0.4;
/// Default cap on the acceleration factor.
const DEFAULT_MAX_ACCEL: f64 = 3.5;
/// Default incline of the post-threshold segment.
const DEFAULT_INCLINE: f64 = 1.1;

/// Piecewise-linear mouse acceleration curve (§4.2 "Linear").
#[derive(Debug, Clone, Copy)]
pub struct LinearProfile {
    threshold: f64,
    max_accel: f64,
    incline: f64,
}

impl Default for LinearProfile {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_accel: DEFAULT_MAX_ACCEL,
            incline: DEFAULT_INCLINE,
        }
    }
}

impl LinearProfile {
    /// A profile for mice at or above 1000 DPI: uses the defaults unscaled.
    #[must_use]
    pub fn for_dpi(dpi: u32) -> Self {
        if dpi >= 1000 {
            Self::default()
        } else {
            // Low-DPI mice see fewer device units per physical distance moved, so the
            // threshold and cap are scaled down proportionally (§4.2 "Linear low-DPI").
            let dpi_factor = f64::from(dpi.max(1)) / 1000.0;
            Self {
                threshold: DEFAULT_THRESHOLD * dpi_factor,
                max_accel: DEFAULT_MAX_ACCEL / dpi_factor.max(f64::EPSILON),
                incline: DEFAULT_INCLINE,
            }
        }
    }

    fn curve(&self, speed_per_ms: f64) -> f64 {
        if speed_per_ms < LOW_THRESHOLD {
            0.1 * speed_per_ms + 0.3
        } else if speed_per_ms < self.threshold {
            1.0
        } else {
            (self.incline * (speed_per_ms - self.threshold) + 1.0).min(self.max_accel)
        }
    }

    /// Adjust the curve by a speed knob in `[-1, 1]`.
    pub fn set_speed(&mut self, adjustment: f64) -> bool {
        let s = super::clamp_speed(adjustment);
        // libinput's documented mapping for the adaptive mouse profile: positive
        // adjustment raises the cap and steepens the incline symmetrically.
        self.max_accel = DEFAULT_MAX_ACCEL * (1.0 + s);
        self.incline = DEFAULT_INCLINE * (1.0 + 0.5 * s);
        true
    }
}

impl AccelProfile for LinearProfile {
    fn factor_at(&self, speed_units_per_us: f64) -> f64 {
        self.curve(speed_units_per_us * 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_is_unity() {
        let profile = LinearProfile::default();
        assert!((profile.factor_at(0.2 / 1_000.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn low_speed_is_gentle_ramp() {
        let profile = LinearProfile::default();
        let f = profile.factor_at(0.0);
        assert!((f - 0.3).abs() < 1e-9);
    }

    #[test]
    fn capped_at_max_accel() {
        let profile = LinearProfile::default();
        let f = profile.factor_at(1000.0 / 1_000.0);
        assert!(f <= DEFAULT_MAX_ACCEL);
    }

    #[test]
    fn low_dpi_rescales_threshold_and_cap() {
        let full = LinearProfile::for_dpi(1000);
        let half = LinearProfile::for_dpi(500);
        assert!(half.threshold < full.threshold);
        assert!(half.max_accel > full.max_accel);
    }

    #[test]
    fn monotonic_above_threshold() {
        let profile = LinearProfile::default();
        let slow = profile.factor_at(0.5 / 1_000.0);
        let fast = profile.factor_at(0.6 / 1_000.0);
        assert!(fast >= slow);
    }
}
