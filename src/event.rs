//! The public output event enumeration (§6 "Output (application side)").

use crate::geom::{DeviceCoords, NormalizedCoords};
use crate::seat::{DeviceId, SeatSlot};
use crate::time::Micros;

/// Press/release state shared by keys, buttons and switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// Released.
    Released,
    /// Pressed.
    Pressed,
}

/// A lid or tablet-mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    /// The laptop lid.
    Lid,
    /// A 2-in-1's tablet-mode switch.
    TabletMode,
}

/// Where a scroll event originated, affecting how a host should interpret its units
/// (§6 `pointer_axis`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    /// A discrete mouse wheel.
    Wheel,
    /// A wheel that also reports continuous tilt.
    WheelTilt,
    /// Finger-driven (e.g. two-finger touchpad scroll); always continuous, no
    /// discrete steps.
    Finger,
    /// Any other continuous source.
    Continuous,
}

/// Which scroll axes are present in a `pointer_axis` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisBitmap {
    /// Vertical scroll is present.
    pub vertical: bool,
    /// Horizontal scroll is present.
    pub horizontal: bool,
}

/// Amount scrolled along one axis: a continuous angle and, for discrete sources, the
/// matching click count.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisValue {
    /// Scroll amount in degrees, per `config.wheel_click_angle`.
    pub degrees: f64,
    /// Discrete click count, `0.0` for continuous sources.
    pub discrete: f64,
}

/// Device capability flags reported on `device_added` (§7.1).
#[derive(Debug, Clone, Copy)]
pub struct Capabilities(CapabilitiesBits);

bitflags::bitflags! {
    struct CapabilitiesBits: u16 {
        const KEYBOARD   = 0b0000_0001;
        const POINTER    = 0b0000_0010;
        const TOUCH      = 0b0000_0100;
        const SWITCH     = 0b0000_1000;
        const GESTURE    = 0b0001_0000;
        const TABLET     = 0b0010_0000;
        const TABLET_PAD = 0b0100_0000;
    }
}

impl Capabilities {
    /// No capabilities set.
    #[must_use]
    pub fn empty() -> Self {
        Self(CapabilitiesBits::empty())
    }

    /// Mark the keyboard capability present.
    #[must_use]
    pub fn with_keyboard(mut self) -> Self {
        self.0.insert(CapabilitiesBits::KEYBOARD);
        self
    }

    /// Mark the pointer capability present.
    #[must_use]
    pub fn with_pointer(mut self) -> Self {
        self.0.insert(CapabilitiesBits::POINTER);
        self
    }

    /// Mark the touch capability present.
    #[must_use]
    pub fn with_touch(mut self) -> Self {
        self.0.insert(CapabilitiesBits::TOUCH);
        self
    }

    /// Mark the switch capability present.
    #[must_use]
    pub fn with_switch(mut self) -> Self {
        self.0.insert(CapabilitiesBits::SWITCH);
        self
    }

    /// True if the keyboard capability is set.
    #[must_use]
    pub fn has_keyboard(self) -> bool {
        self.0.contains(CapabilitiesBits::KEYBOARD)
    }

    /// True if the pointer capability is set.
    #[must_use]
    pub fn has_pointer(self) -> bool {
        self.0.contains(CapabilitiesBits::POINTER)
    }

    /// True if the touch capability is set.
    #[must_use]
    pub fn has_touch(self) -> bool {
        self.0.contains(CapabilitiesBits::TOUCH)
    }

    /// True if the switch capability is set.
    #[must_use]
    pub fn has_switch(self) -> bool {
        self.0.contains(CapabilitiesBits::SWITCH)
    }
}

/// Touch lifecycle phase carried on `touch_down/motion/up/cancel/frame` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    /// A new contact began.
    Down,
    /// An existing contact moved.
    Motion,
    /// A contact lifted normally.
    Up,
    /// A contact was invalidated without a normal lift (e.g. palm rejection).
    Cancel,
    /// Marks the end of a `SYN_REPORT` batch of touch events.
    Frame,
}

/// The public, normalized event stream this crate produces (§6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A device was added to its seat.
    DeviceAdded {
        /// The device.
        device: DeviceId,
        /// Reported capabilities.
        capabilities: Capabilities,
    },
    /// A device was removed.
    DeviceRemoved {
        /// The device.
        device: DeviceId,
    },
    /// A keyboard key changed state.
    KeyboardKey {
        /// Source device.
        device: DeviceId,
        /// Event timestamp.
        time: Micros,
        /// Raw kernel key code.
        code: u16,
        /// New state.
        state: KeyState,
    },
    /// Relative pointer motion.
    PointerMotion {
        /// Source device.
        device: DeviceId,
        /// Event timestamp.
        time: Micros,
        /// Delta after acceleration/profile filtering.
        accelerated: NormalizedCoords,
        /// Delta before acceleration filtering.
        unaccelerated: NormalizedCoords,
    },
    /// Absolute pointer motion, already calibrated to the output area.
    PointerMotionAbsolute {
        /// Source device.
        device: DeviceId,
        /// Event timestamp.
        time: Micros,
        /// Calibrated point.
        point: DeviceCoords,
    },
    /// A pointer button changed state.
    PointerButton {
        /// Source device.
        device: DeviceId,
        /// Event timestamp.
        time: Micros,
        /// Raw kernel button code.
        button: u16,
        /// New state.
        state: KeyState,
        /// Number of buttons currently held across the seat.
        seat_button_count: u32,
    },
    /// A scroll/axis event.
    PointerAxis {
        /// Source device.
        device: DeviceId,
        /// Event timestamp.
        time: Micros,
        /// Which axes are present.
        axes: AxisBitmap,
        /// Source of the scroll.
        source: AxisSource,
        /// Vertical axis value.
        vertical: AxisValue,
        /// Horizontal axis value.
        horizontal: AxisValue,
    },
    /// A multi-touch contact changed.
    Touch {
        /// Source device.
        device: DeviceId,
        /// Event timestamp.
        time: Micros,
        /// Kernel-visible MT slot index.
        slot: usize,
        /// Seat-wide contact identifier, present except on `Frame`.
        seat_slot: Option<SeatSlot>,
        /// Current position, present for `Down`/`Motion`.
        point: Option<DeviceCoords>,
        /// Lifecycle phase.
        phase: TouchPhase,
    },
    /// A lid or tablet-mode switch toggled.
    SwitchToggle {
        /// Source device.
        device: DeviceId,
        /// Event timestamp.
        time: Micros,
        /// Which switch.
        switch: Switch,
        /// New state.
        state: KeyState,
    },
}
