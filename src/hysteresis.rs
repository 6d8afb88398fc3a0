//! Elliptical hysteresis filter (§4.3): a dead zone around a moving center point that
//! resumes motion from the margin edge rather than the center, avoiding a dead-zone
//! after the first responsive move.
//!
//! Grounded on `original_source/src/filter.c`'s `hysteresis_coords` helper.

use crate::geom::DeviceCoords;

/// Elliptical margin radii, one per axis, in device units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    /// Semi-axis along x.
    pub a: f64,
    /// Semi-axis along y.
    pub b: f64,
}

impl Margin {
    /// Build a margin from `max(fuzz, resolution/4)` per axis (§4.8.5).
    #[must_use]
    pub fn from_fuzz_and_resolution(fuzz: (i32, i32), resolution: (i32, i32)) -> Self {
        let axis = |fuzz: i32, resolution: i32| f64::from(fuzz.max(resolution / 4)).max(1.0);
        Self {
            a: axis(fuzz.0, resolution.0),
            b: axis(fuzz.1, resolution.1),
        }
    }
}

/// Filter `point` through an elliptical hysteresis dead zone centered on `center`.
///
/// If the normalized distance `d = sqrt(dx²/a² + dy²/b²) < 1`, the point lies inside
/// the dead zone and `center` is returned unchanged. Otherwise the point on the margin
/// ellipse along the vector from `center` to `point` is returned — motion resumes from
/// the margin edge, not from `center`.
#[must_use]
pub fn filter(point: DeviceCoords, center: DeviceCoords, margin: Margin) -> DeviceCoords {
    let dx = f64::from(point.x - center.x);
    let dy = f64::from(point.y - center.y);

    if margin.a <= 0.0 || margin.b <= 0.0 {
        return point;
    }

    let d = ((dx * dx) / (margin.a * margin.a) + (dy * dy) / (margin.b * margin.b)).sqrt();
    if d < 1.0 {
        return center;
    }

    let scale = 1.0 / d;
    DeviceCoords::new(
        center.x + (dx * scale).round() as i32,
        center.y + (dy * scale).round() as i32,
    )
}

/// A hysteresis filter bound to a moving center, as used per-touch by the touchpad
/// dispatch (§4.8.5).
#[derive(Debug, Clone, Copy)]
pub struct HysteresisFilter {
    center: DeviceCoords,
    margin: Margin,
}

impl HysteresisFilter {
    /// Start a new filter with `center` as the initial center point.
    #[must_use]
    pub fn new(center: DeviceCoords, margin: Margin) -> Self {
        Self { center, margin }
    }

    /// Filter `point`, updating the internal center to the filtered result.
    pub fn filter(&mut self, point: DeviceCoords) -> DeviceCoords {
        let filtered = filter(point, self.center, self.margin);
        self.center = filtered;
        filtered
    }

    /// Reset the center to `point` without filtering (e.g. on touch begin).
    pub fn set_center(&mut self, point: DeviceCoords) {
        self.center = point;
    }

    /// Current center.
    #[must_use]
    pub fn center(&self) -> DeviceCoords {
        self.center
    }
}
