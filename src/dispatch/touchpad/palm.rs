//! Palm detection (§4.8.3): per-touch exclusion from pointer motion, clickfinger
//! counting, tap and gestures once a palm trigger fires.
//!
//! Grounded on `original_source/src/evdev-mt-touchpad.c`'s `tp_palm_detect_*` family,
//! checked here in the same priority order the original documents.

use crate::time::Micros;

/// Why a touch is currently excluded as a palm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalmState {
    /// Not a palm.
    None,
    /// Began in a side/top edge area (§4.8.3 trigger 6).
    Edge,
    /// Began or continued during a DWT window (§4.8.3 trigger 2).
    Typing,
    /// A trackpoint was recently active (§4.8.3 trigger 3).
    Trackpoint,
    /// Kernel reported `MT_TOOL_PALM` (§4.8.3 trigger 4).
    ToolPalm,
    /// Pressure exceeded the palm threshold (§4.8.3 trigger 1). Latched.
    Pressure,
    /// Touch size exceeded the palm threshold (§4.8.3 trigger 5). Latched.
    TouchSize,
}

impl PalmState {
    /// True if the touch is currently excluded from pointer/tap/gesture consumers.
    #[must_use]
    pub fn is_excluded(self) -> bool {
        !matches!(self, Self::None)
    }

    fn is_latched(self) -> bool {
        matches!(self, Self::Pressure | Self::TouchSize)
    }
}

/// Geometry needed to evaluate the edge trigger, in device-unit space.
#[derive(Debug, Clone, Copy)]
pub struct EdgeZone {
    /// Width-fraction from each side edge that counts as "edge" (§4.8.3: 8%).
    pub side_fraction: f64,
    /// Height-fraction from the top edge that counts as "edge" (§4.8.3: 5%).
    pub top_fraction: f64,
    /// Device x range.
    pub width: i32,
    /// Device y range.
    pub height: i32,
}

impl EdgeZone {
    /// True if `x, y` (device coords) falls within the side or top edge band.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let side = f64::from(self.width) * self.side_fraction;
        let top = f64::from(self.height) * self.top_fraction;
        f64::from(x) < side || f64::from(x) > f64::from(self.width) - side || f64::from(y) < top
    }
}

/// Per-touch palm tracking state.
#[derive(Debug, Clone, Copy)]
pub struct PalmTracker {
    state: PalmState,
    began_at: Micros,
    began_in_edge: bool,
}

impl PalmTracker {
    /// Start tracking a new touch beginning at `time`, recording whether it began
    /// inside the edge zone.
    #[must_use]
    pub fn new(time: Micros, began_in_edge: bool) -> Self {
        Self {
            state: if began_in_edge {
                PalmState::Edge
            } else {
                PalmState::None
            },
            began_at: time,
            began_in_edge,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PalmState {
        self.state
    }

    /// True if this touch began inside the edge zone.
    #[must_use]
    pub fn began_in_edge(&self) -> bool {
        self.began_in_edge
    }

    /// Evaluate the palm triggers for one frame, in §4.8.3's documented priority
    /// order. Latched states (`Pressure`, `TouchSize`) never downgrade once set.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &mut self,
        time: Micros,
        pressure: Option<f64>,
        pressure_threshold: Option<f64>,
        is_typing: bool,
        trackpoint_active: bool,
        is_tool_palm: bool,
        touch_size: Option<f64>,
        size_threshold: Option<f64>,
        other_touch_active: bool,
        moved_away_from_edge: bool,
    ) {
        if self.state.is_latched() {
            return;
        }

        if let (Some(pressure), Some(threshold)) = (pressure, pressure_threshold) {
            if pressure > threshold {
                self.state = PalmState::Pressure;
                return;
            }
        }

        if is_typing {
            self.state = PalmState::Typing;
            return;
        }
        if self.state == PalmState::Typing && !is_typing {
            self.state = PalmState::None;
        }

        if trackpoint_active {
            self.state = PalmState::Trackpoint;
            return;
        }
        if self.state == PalmState::Trackpoint && !trackpoint_active {
            self.state = PalmState::None;
        }

        if is_tool_palm {
            self.state = PalmState::ToolPalm;
            return;
        }
        if self.state == PalmState::ToolPalm && !is_tool_palm {
            self.state = PalmState::None;
        }

        if let (Some(size), Some(threshold)) = (touch_size, size_threshold) {
            if size > threshold {
                self.state = PalmState::TouchSize;
                return;
            }
        }

        if self.state == PalmState::Edge {
            let timed_out = time.elapsed_ms(self.began_at, 200);
            if other_touch_active || (moved_away_from_edge && !timed_out) {
                self.state = PalmState::None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_trigger_latches() {
        let mut palm = PalmTracker::new(Micros(0), false);
        palm.evaluate(
            Micros(10),
            Some(5.0),
            Some(3.0),
            false,
            false,
            false,
            None,
            None,
            false,
            false,
        );
        assert_eq!(palm.state(), PalmState::Pressure);
        // Even if pressure drops, the latch holds.
        palm.evaluate(
            Micros(20),
            Some(0.0),
            Some(3.0),
            false,
            false,
            false,
            None,
            None,
            false,
            false,
        );
        assert_eq!(palm.state(), PalmState::Pressure);
    }

    #[test]
    fn typing_trigger_releases_when_typing_stops() {
        let mut palm = PalmTracker::new(Micros(0), false);
        palm.evaluate(Micros(10), None, None, true, false, false, None, None, false, false);
        assert_eq!(palm.state(), PalmState::Typing);
        palm.evaluate(Micros(10), None, None, false, false, false, None, None, false, false);
        assert_eq!(palm.state(), PalmState::None);
    }

    #[test]
    fn edge_trigger_releases_on_multi_finger() {
        let mut palm = PalmTracker::new(Micros(0), true);
        assert_eq!(palm.state(), PalmState::Edge);
        palm.evaluate(
            Micros(10),
            None,
            None,
            false,
            false,
            false,
            None,
            None,
            true,
            false,
        );
        assert_eq!(palm.state(), PalmState::None);
    }

    #[test]
    fn edge_zone_detects_side_and_top() {
        let zone = EdgeZone {
            side_fraction: 0.08,
            top_fraction: 0.05,
            width: 1000,
            height: 500,
        };
        assert!(zone.contains(10, 250));
        assert!(zone.contains(500, 5));
        assert!(!zone.contains(500, 250));
    }
}
