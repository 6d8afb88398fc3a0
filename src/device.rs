//! The per-device record (§6 "static per-device descriptors", §3 "A device record is
//! created when the device-manager adds the device").
//!
//! Grounded on `original_source/src/evdev.h`'s `evdev_device` struct, which bundles
//! the kernel-reported descriptor fields with the dispatch-specific state this crate
//! splits out into `mt::SlotTable`/`key::KeyBitset`/`config::DeviceConfig`.

use crate::config::DeviceConfig;
use crate::key::KeyBitset;
use crate::mt::SlotTable;
use crate::quirks::DeviceQuirks;
use crate::seat::DeviceId;

bitflags::bitflags! {
    /// `INPUT_PROP_*` bits relevant to this crate (§6).
    #[derive(Default)]
    pub struct InputProps: u8 {
        /// `INPUT_PROP_DIRECT`: absolute coordinates map 1:1 to the display (touch
        /// screens), as opposed to a relative touchpad surface.
        const DIRECT = 0b0000_0001;
        /// `INPUT_PROP_SEMI_MT`: the device reports true multitouch only for bounding
        /// box, not per-finger tracking.
        const SEMI_MT = 0b0000_0010;
        /// `INPUT_PROP_BUTTONPAD`: the whole touchpad surface is a mechanical button
        /// (a clickpad).
        const BUTTONPAD = 0b0000_0100;
    }
}

/// One axis's calibration descriptor (§6 `per-axis {min, max, fuzz, flat,
/// resolution, value}`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisInfo {
    /// Minimum reported value.
    pub min: i32,
    /// Maximum reported value.
    pub max: i32,
    /// Noise threshold the kernel already filters by.
    pub fuzz: i32,
    /// Dead zone around center (joystick-style axes; unused by touchpads).
    pub flat: i32,
    /// Units per mm (0 if unknown — see `geom::AxisResolution` fallback).
    pub resolution: i32,
    /// Last reported raw value.
    pub value: i32,
}

/// Kernel identity fields (§6 "bus/vendor/product/version ids").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceIdentity {
    /// Bus type (USB, Bluetooth, i2c, ...).
    pub bus_type: u16,
    /// Vendor id.
    pub vendor: u16,
    /// Product id.
    pub product: u16,
    /// Firmware/version id.
    pub version: u16,
}

/// Whether this device's EV_ABS data should route through the MT slot processor
/// (§4.4) or be treated as a single absolute axis pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsKind {
    /// No absolute axes.
    None,
    /// A single-touch absolute device (e.g. a resistive touch screen).
    SingleTouch,
    /// A true multi-touch device; `slot_count` is the number of `ABS_MT_SLOT` values.
    MultiTouch {
        /// Number of addressable MT slots.
        slot_count: usize,
    },
}

/// A live input device, owning its kernel-state mirror, touch slot table, hardware
/// key bitmask and active configuration (§3 "A device record... owns its slot array
/// and timers").
#[derive(Debug, Clone)]
pub struct Device {
    /// Stable identifier within the owning seat.
    pub id: DeviceId,
    /// Kernel-reported name string.
    pub name: String,
    /// Bus/vendor/product/version identity.
    pub identity: DeviceIdentity,
    /// `INPUT_PROP_*` bits.
    pub props: InputProps,
    /// Horizontal axis calibration, when this device reports relative or absolute X.
    pub x_axis: AxisInfo,
    /// Vertical axis calibration.
    pub y_axis: AxisInfo,
    /// Absolute-axis routing.
    pub abs_kind: AbsKind,
    /// Multi-touch slot table, present when `abs_kind` routes through it.
    pub slots: Option<SlotTable>,
    /// Hardware keys/buttons currently held.
    pub keys: KeyBitset,
    /// Quirk properties resolved at add-time.
    pub quirks: DeviceQuirks,
    /// Live configuration.
    pub config: DeviceConfig,
    /// Whether the device is currently suspended (§4.8.6 send-events, §4.7 lid).
    pub suspended: bool,
}

impl Device {
    /// Construct a device record at add-time; `abs_kind` determines whether a
    /// [`SlotTable`] is allocated.
    #[must_use]
    pub fn new(
        id: DeviceId,
        name: impl Into<String>,
        identity: DeviceIdentity,
        props: InputProps,
        abs_kind: AbsKind,
        quirks: DeviceQuirks,
    ) -> Self {
        let slots = match abs_kind {
            AbsKind::None => None,
            AbsKind::SingleTouch => Some(SlotTable::new(1)),
            AbsKind::MultiTouch { slot_count } => Some(SlotTable::new(slot_count)),
        };
        Self {
            id,
            name: name.into(),
            identity,
            props,
            x_axis: AxisInfo::default(),
            y_axis: AxisInfo::default(),
            abs_kind,
            slots,
            keys: KeyBitset::new(),
            quirks,
            config: DeviceConfig::default(),
            suspended: false,
        }
    }

    /// True if this is a clickpad (§10 glossary: `BTN_TOOL_FINGER` capable surface
    /// plus `BUTTONPAD`).
    #[must_use]
    pub fn is_clickpad(&self) -> bool {
        self.props.contains(InputProps::BUTTONPAD)
    }

    /// True if the device only reports multitouch as a bounding box, not per-finger
    /// tracking.
    #[must_use]
    pub fn is_semi_mt(&self) -> bool {
        self.props.contains(InputProps::SEMI_MT)
    }

    /// Suspend the device: clears transient state so resume re-syncs cleanly (§4.8.6
    /// "Resume from suspend re-syncs every slot's position").
    pub fn suspend(&mut self) {
        self.suspended = true;
        self.keys.clear();
    }

    /// Resume a suspended device.
    pub fn resume(&mut self) {
        self.suspended = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_device(abs_kind: AbsKind) -> Device {
        Device::new(
            DeviceId(0),
            "Test Touchpad",
            DeviceIdentity::default(),
            InputProps::BUTTONPAD,
            abs_kind,
            DeviceQuirks::default(),
        )
    }

    #[test]
    fn multitouch_device_gets_a_slot_table() {
        let device = sample_device(AbsKind::MultiTouch { slot_count: 5 });
        assert_eq!(device.slots.unwrap().len(), 5);
    }

    #[test]
    fn pointer_only_device_has_no_slot_table() {
        let device = sample_device(AbsKind::None);
        assert!(device.slots.is_none());
    }

    #[test]
    fn is_clickpad_reflects_buttonpad_prop() {
        let device = sample_device(AbsKind::None);
        assert!(device.is_clickpad());
    }

    #[test]
    fn suspend_clears_held_keys() {
        let mut device = sample_device(AbsKind::None);
        device.keys.press(272); // BTN_LEFT
        device.suspend();
        assert!(device.keys.iter_held().next().is_none());
    }
}
