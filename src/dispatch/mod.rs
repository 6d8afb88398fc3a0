//! Per-device dispatch dispatch table (§9: "a tagged enum over dispatch kind, not a
//! trait object — the method table is small and fixed, and every device's kind is
//! known at add-time").
//!
//! Grounded on `original_source/src/evdev.h`'s `evdev_dispatch_interface` vtable,
//! reshaped from a C function-pointer struct into a Rust enum match.

pub mod fallback;
pub mod touchpad;

use crate::arbitration::Arbitration;
use crate::device::Device;
use crate::event::Event;
use crate::lid::LidSwitch;
use crate::seat::Seat;
use crate::time::Micros;

use self::fallback::{FallbackDispatch, RawEvent};
use self::touchpad::TouchpadDispatch;

/// The dispatch strategy bound to one device at add-time. `Tablet`/`TabletPad` name
/// capabilities this crate recognizes but does not implement (§1 Non-goals); they are
/// never constructed, kept only so the match stays exhaustive as those are added.
pub enum Dispatch {
    /// Plain pointer, keyboard or switch device (§4.5).
    Fallback(FallbackDispatch),
    /// A touchpad, internal or external (§4.8).
    Touchpad(TouchpadDispatch),
    /// A graphics tablet. Unimplemented.
    Tablet,
    /// A tablet's button pad. Unimplemented.
    TabletPad,
}

impl Dispatch {
    /// Feed one raw kernel event through this device's dispatch strategy. `arbitration`
    /// supplies the cross-device typing/trackpoint signals a touchpad's palm detector
    /// consults (§4.9); the host is responsible for feeding trackpoint and keyboard
    /// devices' own events into it as they arrive.
    pub fn process(
        &mut self,
        device: &mut Device,
        seat: &mut Seat,
        raw: RawEvent,
        arbitration: &Arbitration,
        out: &mut Vec<Event>,
    ) {
        if device.suspended {
            return;
        }
        match self {
            Self::Fallback(d) => d.handle(device, seat, raw, out),
            Self::Touchpad(d) => d.handle(device, seat, raw, arbitration, out),
            Self::Tablet | Self::TabletPad => {}
        }
    }

    /// Suspend the device, synthesizing releases for anything held (§4.8.8).
    pub fn suspend(&mut self, device: &mut Device, seat: &mut Seat, time: Micros, out: &mut Vec<Event>) {
        match self {
            Self::Fallback(d) => d.suspend(device, seat, time, out),
            Self::Touchpad(_) => device.suspend(),
            Self::Tablet | Self::TabletPad => device.suspend(),
        }
    }

    /// Resume a suspended device.
    pub fn resume(&mut self, device: &mut Device) {
        device.resume();
    }

    /// The debounce timer for this device fired; flush its held-back release.
    pub fn flush_debounced_release(&mut self, device: &mut Device, button: u16, out: &mut Vec<Event>) {
        match self {
            Self::Fallback(d) => d.flush_debounced_release(device, button, out),
            Self::Touchpad(d) => d.flush_debounced_release(device, button, out),
            Self::Tablet | Self::TabletPad => {}
        }
    }

    /// Pair an internal keyboard with this device's lid switch, if it has one
    /// (§4.7). Returns `false` for dispatch kinds that carry no lid (touchpads and
    /// tablets are never paired directly; only the keyboard/fallback side of a
    /// clamshell is).
    pub fn pair_lid_keyboard(&mut self, keyboard: crate::seat::DeviceId) -> bool {
        match self {
            Self::Fallback(d) => d.pair_keyboard(keyboard),
            Self::Touchpad(_) | Self::Tablet | Self::TabletPad => false,
        }
    }
}

/// Build the fallback dispatch for a non-touchpad device, optionally paired with a
/// lid switch (§4.7).
#[must_use]
pub fn fallback_dispatch(is_pointer: bool, lid: Option<LidSwitch>) -> Dispatch {
    Dispatch::Fallback(FallbackDispatch::new(is_pointer, lid))
}

/// Build touchpad dispatch for a device with `slot_count` MT slots.
#[must_use]
pub fn touchpad_dispatch(
    slot_count: usize,
    resolution: crate::geom::AxisResolution,
    margin: crate::hysteresis::Margin,
    edge_zone: self::touchpad::palm::EdgeZone,
    is_clickpad: bool,
) -> Dispatch {
    Dispatch::Touchpad(TouchpadDispatch::new(
        slot_count,
        resolution,
        margin,
        edge_zone,
        is_clickpad,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AbsKind, DeviceIdentity, InputProps};
    use crate::quirks::DeviceQuirks;
    use crate::seat::DeviceId;

    #[test]
    fn suspended_device_ignores_further_events() {
        let mut dispatch = fallback_dispatch(true, None);
        let mut device = Device::new(
            DeviceId(0),
            "Test Mouse",
            DeviceIdentity::default(),
            InputProps::empty(),
            AbsKind::None,
            DeviceQuirks::default(),
        );
        let mut seat = Seat::new("seat0");
        let arbitration = Arbitration::new();
        let mut out = Vec::new();

        dispatch.suspend(&mut device, &mut seat, Micros(0), &mut out);
        out.clear();

        dispatch.process(
            &mut device,
            &mut seat,
            RawEvent {
                kind: self::fallback::RawEventKind::Key,
                code: evdev::Key::KEY_A.0,
                value: 1,
                time: Micros(10),
            },
            &arbitration,
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn pair_lid_keyboard_delegates_to_fallback_lid() {
        use crate::lid::LidSwitch;
        use crate::quirks::LidSwitchReliability;

        let mut no_lid = fallback_dispatch(false, None);
        assert!(!no_lid.pair_lid_keyboard(DeviceId(1)));

        let mut with_lid = fallback_dispatch(
            false,
            Some(LidSwitch::new(LidSwitchReliability::Reliable)),
        );
        assert!(with_lid.pair_lid_keyboard(DeviceId(1)));
    }
}
