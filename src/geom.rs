//! Device, normalized and physical coordinate spaces (§3).
//!
//! Device coordinates are raw integer units in a device's own kernel axis space.
//! Normalized coordinates are device-independent floats calibrated so one unit equals
//! one unit on a reference 1000-DPI mouse. Physical coordinates are millimeters,
//! derived from a device's axis resolution (units per millimeter).

/// A point or delta in raw device coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceCoords {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

impl DeviceCoords {
    /// Construct from x/y.
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A floating-point delta in raw device coordinate space, before DPI normalization.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceFloatCoords {
    /// X delta.
    pub x: f64,
    /// Y delta.
    pub y: f64,
}

impl DeviceFloatCoords {
    /// Construct from x/y.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean magnitude.
    #[must_use]
    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Componentwise subtraction.
    #[must_use]
    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }

    /// Componentwise addition.
    #[must_use]
    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }

    /// Scale both axes by the same factor.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl From<DeviceCoords> for DeviceFloatCoords {
    fn from(value: DeviceCoords) -> Self {
        Self::new(f64::from(value.x), f64::from(value.y))
    }
}

/// A delta normalized so 1 unit corresponds to 1 unit of motion on a reference
/// 1000-DPI mouse. The acceleration filter always produces and consumes this type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedCoords {
    /// X delta.
    pub x: f64,
    /// Y delta.
    pub y: f64,
}

impl NormalizedCoords {
    /// Construct from x/y.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The zero delta.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Euclidean magnitude.
    #[must_use]
    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Scale both axes by the same factor.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// A point or delta in physical millimeters, derived via a device's axis resolution
/// (`units per mm`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicalCoords {
    /// X in millimeters.
    pub x: f64,
    /// Y in millimeters.
    pub y: f64,
}

impl PhysicalCoords {
    /// Construct from x/y.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean magnitude, in millimeters.
    #[must_use]
    pub fn hypot(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Resolution of a device's axes, in device units per millimeter. Zero means "unknown"
/// and callers should fall back to a conservative default (libinput uses 10 units/mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisResolution {
    /// X units per millimeter.
    pub x: f64,
    /// Y units per millimeter.
    pub y: f64,
}

impl AxisResolution {
    /// Fallback resolution used when a device reports none.
    pub const FALLBACK_UNITS_PER_MM: f64 = 10.0;

    /// Build from raw kernel `ABS_X`/`ABS_Y` resolution fields (units per mm), falling
    /// back to [`Self::FALLBACK_UNITS_PER_MM`] for non-positive values.
    #[must_use]
    pub fn from_raw(x: i32, y: i32) -> Self {
        let fallback = Self::FALLBACK_UNITS_PER_MM;
        Self {
            x: if x > 0 { f64::from(x) } else { fallback },
            y: if y > 0 { f64::from(y) } else { fallback },
        }
    }

    /// Convert a device-unit delta to millimeters.
    #[must_use]
    pub fn to_mm(self, coords: DeviceFloatCoords) -> PhysicalCoords {
        PhysicalCoords::new(coords.x / self.x, coords.y / self.y)
    }

    /// Convert a device-unit delta to units normalized against a 1000-DPI mouse
    /// (`39.37` units/mm), i.e. the DPI-normalization step described in §4.2.
    #[must_use]
    pub fn to_normalized(self, coords: DeviceFloatCoords) -> NormalizedCoords {
        const REFERENCE_UNITS_PER_MM: f64 = 1000.0 / 25.4;
        let mm = self.to_mm(coords);
        NormalizedCoords::new(
            mm.x * REFERENCE_UNITS_PER_MM,
            mm.y * REFERENCE_UNITS_PER_MM,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_mm_roundtrips_with_resolution() {
        let res = AxisResolution::from_raw(12, 12);
        let mm = res.to_mm(DeviceFloatCoords::new(120.0, 12.0));
        assert!((mm.x - 10.0).abs() < 1e-9);
        assert!((mm.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fallback_resolution_used_when_non_positive() {
        let res = AxisResolution::from_raw(0, -5);
        assert_eq!(res.x, AxisResolution::FALLBACK_UNITS_PER_MM);
        assert_eq!(res.y, AxisResolution::FALLBACK_UNITS_PER_MM);
    }
}
