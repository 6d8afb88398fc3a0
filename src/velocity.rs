//! Velocity tracker (§4.1): a 16-sample ring of recent motion, reporting smoothed
//! instantaneous velocity to the acceleration filters.
//!
//! Grounded on `original_source/src/filter.c`'s `trackers_by_time`/`tracker` logic:
//! each sample accumulates younger deltas on top of it as `feed` is called, so walking
//! back from the newest sample gives the total motion since that sample's timestamp.

use crate::geom::DeviceFloatCoords;
use crate::ring::RingBuffer;
use crate::time::Micros;

const CAPACITY: usize = 16;
const MOTION_TIMEOUT_MS: u64 = 1_000;
/// Maximum difference between two consecutive per-sample speeds, in units/ms, before
/// velocity tracking stops walking further back (direction/speed reversal).
const MAX_VELOCITY_DIFF_PER_MS: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
struct Sample {
    delta: DeviceFloatCoords,
    time: Micros,
    /// Bit 0 = x was >=0 this sample, bit 1 = y was >=0 this sample. Used to detect a
    /// direction reversal by ANDing across samples.
    direction_bits: u8,
}

fn direction_bits(delta: DeviceFloatCoords) -> u8 {
    let mut bits = 0u8;
    if delta.x >= 0.0 {
        bits |= 0b01;
    }
    if delta.y >= 0.0 {
        bits |= 0b10;
    }
    bits
}

/// Maps a raw inter-event duration to a minimum "effective" duration, used for devices
/// (touchpads) that batch multiple reports into one timestamp.
pub trait Smoothener {
    /// Smooth a duration in microseconds.
    fn smooth(&self, dt_us: u64) -> u64;
}

/// The default smoothener: a no-op identity pass-through.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySmoothener;

impl Smoothener for IdentitySmoothener {
    fn smooth(&self, dt_us: u64) -> u64 {
        dt_us
    }
}

/// A smoothener enforcing a minimum effective interval, used for touchpads whose
/// driver occasionally reports two frames back-to-back with a near-zero gap.
#[derive(Debug, Clone, Copy)]
pub struct MinIntervalSmoothener {
    /// Minimum interval, in microseconds.
    pub min_us: u64,
}

impl Smoothener for MinIntervalSmoothener {
    fn smooth(&self, dt_us: u64) -> u64 {
        dt_us.max(self.min_us)
    }
}

/// Fixed-ring velocity tracker (§4.1).
#[derive(Debug, Clone)]
pub struct VelocityTracker<S = IdentitySmoothener> {
    ring: RingBuffer<Sample, CAPACITY>,
    smoothener: S,
}

impl Default for VelocityTracker<IdentitySmoothener> {
    fn default() -> Self {
        Self::new(IdentitySmoothener)
    }
}

impl<S: Smoothener> VelocityTracker<S> {
    /// Construct an empty tracker with the given smoothener.
    #[must_use]
    pub fn new(smoothener: S) -> Self {
        Self {
            ring: RingBuffer::new(),
            smoothener,
        }
    }

    /// Reset all history, e.g. on a new touch sequence (`restart`, §4.2).
    pub fn reset(&mut self) {
        self.ring.clear();
    }

    /// Feed a new delta at time `t`: accumulates `delta` into every existing sample,
    /// then writes a fresh zero-delta sample for `t` at the head.
    pub fn feed(&mut self, delta: DeviceFloatCoords, t: Micros) {
        self.ring.for_each_mut(|sample| {
            sample.delta = sample.delta.add(delta);
        });
        self.ring.push(Sample {
            delta: DeviceFloatCoords::default(),
            time: t,
            direction_bits: direction_bits(delta),
        });
    }

    /// Compute smoothed instantaneous velocity at time `t`, in device units per
    /// microsecond.
    #[must_use]
    pub fn velocity(&self, t: Micros) -> f64 {
        let mut direction_mask = 0xffu8;
        let mut prev_velocity: Option<f64> = None;
        let mut last_velocity = 0.0;

        for (i, sample) in self.ring.iter_back().enumerate() {
            let mut dt = self.smoothener.smooth(t.since(sample.time));
            let timed_out = t.since(sample.time) > MOTION_TIMEOUT_MS * 1_000;
            if timed_out {
                if i == 1 {
                    // First historical sample already past timeout (i == 0 is always
                    // the zero-delta sample `feed` just wrote at the query time itself):
                    // behave as if the timeout had just elapsed, giving a reasonable
                    // floor velocity after a pause.
                    dt = MOTION_TIMEOUT_MS * 1_000;
                } else {
                    break;
                }
            }

            direction_mask &= sample.direction_bits | 0b1111_1100;
            if i > 0 && direction_mask & 0b11 == 0 {
                break;
            }

            let speed = sample.delta.hypot() / (dt as f64 + 1.0);
            if let Some(prev) = prev_velocity {
                if (speed - prev).abs() > MAX_VELOCITY_DIFF_PER_MS / 1_000.0 {
                    break;
                }
            }
            prev_velocity = Some(speed);
            last_velocity = speed;

            if timed_out {
                break;
            }
        }

        last_velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_has_zero_velocity() {
        let tracker = VelocityTracker::<IdentitySmoothener>::default();
        assert_eq!(tracker.velocity(Micros(1_000)), 0.0);
    }

    #[test]
    fn constant_motion_gives_stable_velocity() {
        let mut tracker = VelocityTracker::<IdentitySmoothener>::default();
        let mut t = Micros(0);
        for _ in 0..8 {
            tracker.feed(DeviceFloatCoords::new(1.0, 0.0), t);
            t = t + 1_000;
        }
        let v = tracker.velocity(t);
        assert!(v > 0.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut tracker = VelocityTracker::<IdentitySmoothener>::default();
        tracker.feed(DeviceFloatCoords::new(5.0, 5.0), Micros(0));
        tracker.reset();
        assert_eq!(tracker.velocity(Micros(100)), 0.0);
    }

    #[test]
    fn stale_sample_uses_timeout_floor() {
        let mut tracker = VelocityTracker::<IdentitySmoothener>::default();
        tracker.feed(DeviceFloatCoords::new(50.0, 0.0), Micros(0));
        tracker.feed(DeviceFloatCoords::new(10.0, 0.0), Micros(2_000_000));
        // Query at the same time as the second feed: the first historical sample is
        // 2s stale, well past the 1s motion timeout, so its speed is computed against
        // the timeout floor rather than 0.
        let v = tracker.velocity(Micros(2_000_000));
        assert!(v > 0.0 && v < 1.0);
    }
}
