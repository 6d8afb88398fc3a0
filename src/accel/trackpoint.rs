//! Trackpoint acceleration profile (§4.2): `delta * incline + offset`, capped at
//! `max_accel`, with input pre-averaged over 4 samples and clipped to a max delta.
//!
//! This doesn't fit the speed-to-factor [`super::AccelProfile`] shape the other
//! profiles share — it operates directly on the delta, not on tracked velocity — so it
//! is its own small pipeline, grounded on `original_source/src/filter-trackpoint.c`.

use crate::geom::{DeviceFloatCoords, NormalizedCoords};
use crate::ring::RingBuffer;

/// Maximum raw delta (device units) accepted before clipping; protects against driver
/// glitches that report huge single-sample jumps.
const DEFAULT_MAX_DELTA: f64 = 25.0;
const AVERAGING_SAMPLES: usize = 4;

/// Trackpoint acceleration filter.
#[derive(Debug, Clone)]
pub struct TrackpointProfile {
    incline: f64,
    offset: f64,
    max_accel: f64,
    max_delta: f64,
    history: RingBuffer<DeviceFloatCoords, AVERAGING_SAMPLES>,
}

impl Default for TrackpointProfile {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TrackpointProfile {
    /// Build a profile from a speed adjustment in `[-1, 1]`, using the documented
    /// formulas `max = 4.6 * e^(1.2*s)`, `incline = 0.8*s + 1.04`.
    #[must_use]
    pub fn new(adjustment: f64) -> Self {
        let mut profile = Self {
            incline: 0.0,
            offset: 1.0,
            max_accel: 0.0,
            max_delta: DEFAULT_MAX_DELTA,
            history: RingBuffer::new(),
        };
        profile.set_speed(adjustment);
        profile
    }

    /// Re-derive `incline`/`max_accel` from a new speed adjustment.
    pub fn set_speed(&mut self, adjustment: f64) -> bool {
        let s = super::clamp_speed(adjustment);
        self.max_accel = 4.6 * (1.2 * s).exp();
        self.incline = 0.8 * s + 1.04;
        true
    }

    /// Reset the averaging history, e.g. on restart.
    pub fn restart(&mut self) {
        self.history.clear();
    }

    /// Filter one raw delta: average over the last 4 samples (inclusive of this one),
    /// clip to `max_delta`, then apply `incline`/`offset`, capped at `max_accel`.
    pub fn filter(&mut self, raw_delta: DeviceFloatCoords) -> NormalizedCoords {
        let clipped = DeviceFloatCoords::new(
            raw_delta.x.clamp(-self.max_delta, self.max_delta),
            raw_delta.y.clamp(-self.max_delta, self.max_delta),
        );
        self.history.push(clipped);

        let count = self.history.len() as f64;
        let mut sum = DeviceFloatCoords::default();
        for sample in self.history.iter_back() {
            sum = sum.add(*sample);
        }
        let averaged = DeviceFloatCoords::new(sum.x / count, sum.y / count);

        // `delta * incline + offset`, capped at `max_accel`; the cap bounds magnitude
        // only, it never flips sign.
        let accelerate = |v: f64| {
            if v == 0.0 {
                return 0.0;
            }
            let magnitude = (v.abs() * self.incline + self.offset).min(self.max_accel);
            magnitude * v.signum()
        };

        NormalizedCoords::new(accelerate(averaged.x), accelerate(averaged.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delta_stays_zero() {
        let mut profile = TrackpointProfile::new(0.0);
        let out = profile.filter(DeviceFloatCoords::new(0.0, 0.0));
        assert_eq!(out, NormalizedCoords::new(0.0, 0.0));
    }

    #[test]
    fn large_delta_is_capped() {
        let mut profile = TrackpointProfile::new(0.0);
        let out = profile.filter(DeviceFloatCoords::new(1_000.0, 0.0));
        assert!(out.x <= profile.max_accel + 1e-6);
    }

    #[test]
    fn positive_speed_adjustment_raises_cap() {
        let low = TrackpointProfile::new(-1.0);
        let high = TrackpointProfile::new(1.0);
        assert!(high.max_accel > low.max_accel);
    }

    #[test]
    fn restart_clears_averaging_history() {
        let mut profile = TrackpointProfile::new(0.0);
        profile.filter(DeviceFloatCoords::new(5.0, 5.0));
        profile.restart();
        assert!(profile.history.is_empty());
    }
}
