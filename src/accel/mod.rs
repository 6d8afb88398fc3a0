//! Acceleration filter subsystem (§4.2): converts raw device deltas into normalized
//! pointer motion through velocity-tracker-based acceleration curves.
//!
//! Grounded on `original_source/src/filter.c` (dispatch + Simpson's-rule smoothing)
//! and the per-profile files `filter-touchpad.c`, `filter-trackpoint.c`,
//! `filter-custom.c`.

pub mod custom;
pub mod flat;
pub mod linear;
pub mod touchpad;
pub mod trackpoint;

use crate::geom::{DeviceFloatCoords, NormalizedCoords};
use crate::time::Micros;
use crate::velocity::{IdentitySmoothener, VelocityTracker};

/// A named speed-to-factor curve profile (§4.2 "Profile (acceleration)").
pub trait AccelProfile: std::fmt::Debug {
    /// Map an instantaneous speed (device units/µs) to an acceleration factor.
    fn factor_at(&self, speed: f64) -> f64;

    /// Apply DPI normalization either before or after the curve is evaluated.
    fn normalize_pre(&self) -> bool {
        false
    }
}

/// `filter`/`filter_constant`/`restart`/`set_speed` entry points (§4.2), generic over
/// any [`AccelProfile`].
#[derive(Debug)]
pub struct AccelFilter<P> {
    profile: P,
    tracker: VelocityTracker<IdentitySmoothener>,
    last_velocity: Option<f64>,
}

impl<P: AccelProfile> AccelFilter<P> {
    /// Build a filter around a profile.
    #[must_use]
    pub fn new(profile: P) -> Self {
        Self {
            profile,
            tracker: VelocityTracker::default(),
            last_velocity: None,
        }
    }

    /// Apply the profile curve to `raw_delta` reported at `time`.
    pub fn filter(&mut self, raw_delta: DeviceFloatCoords, time: Micros) -> NormalizedCoords {
        self.tracker.feed(raw_delta, time);
        let velocity = self.tracker.velocity(time);

        let factor = simpsons_factor(&self.profile, self.last_velocity, velocity);
        self.last_velocity = Some(velocity);

        accelerate(raw_delta, factor)
    }

    /// Bypass acceleration entirely (for slow-motion or special axes).
    #[must_use]
    pub fn filter_constant(&self, raw_delta: DeviceFloatCoords) -> NormalizedCoords {
        NormalizedCoords::new(raw_delta.x, raw_delta.y)
    }

    /// Reset the velocity tracker, e.g. for a new touch sequence.
    pub fn restart(&mut self, _time: Micros) {
        self.tracker.reset();
        self.last_velocity = None;
    }

    /// Access the underlying profile (e.g. to call `set_speed`).
    pub fn profile_mut(&mut self) -> &mut P {
        &mut self.profile
    }

    /// Access the underlying profile.
    pub fn profile(&self) -> &P {
        &self.profile
    }
}

fn accelerate(raw_delta: DeviceFloatCoords, factor: f64) -> NormalizedCoords {
    NormalizedCoords::new(raw_delta.x * factor, raw_delta.y * factor)
}

/// Smooth a curve transition using Simpson's rule over
/// `(previous_velocity, current_velocity, midpoint)`, per §4.2.
fn simpsons_factor(profile: &dyn AccelProfile, previous: Option<f64>, current: f64) -> f64 {
    let Some(previous) = previous else {
        return profile.factor_at(current);
    };
    let midpoint = (previous + current) / 2.0;
    let f0 = profile.factor_at(previous);
    let f1 = profile.factor_at(midpoint);
    let f2 = profile.factor_at(current);
    (f0 + 4.0 * f1 + f2) / 6.0
}

/// Clamp a speed-adjustment knob to the documented `[-1, 1]` range (§4.2).
#[must_use]
pub fn clamp_speed(adjustment: f64) -> f64 {
    adjustment.clamp(-1.0, 1.0)
}
