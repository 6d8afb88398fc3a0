//! Device quirks lookup (§6 "Quirk properties", §6.1 `QuirksTable`).
//!
//! Quirk DB parsing is explicitly out of scope (§1 Non-goals); this module only
//! defines the value type the host's quirks lookup returns and the fallback used when
//! a host doesn't have one, grounded on how `Smithay-smithay`'s `backend::libinput`
//! wraps external collaborators behind small traits rather than owning their data.

/// Lid-switch reliability, as read from the quirks DB (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LidSwitchReliability {
    /// No information; treat the switch as reliable.
    #[default]
    Unknown,
    /// The switch can be trusted to report both open and close.
    Reliable,
    /// The switch only reliably reports "open" events.
    WriteOpen,
}

/// Touchpad-keyboard combo device layout (§6 `TPKBCOMBO_LAYOUT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TpkbComboLayout {
    /// No information.
    #[default]
    Unknown,
    /// The touchpad sits below the keyboard on the same physical device.
    Below,
}

/// A `hi:lo` hysteresis threshold pair (§6 `PRESSURE_RANGE`, `TOUCH_SIZE_RANGE`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Threshold {
    /// Upper threshold (crossing it upward triggers).
    pub high: f64,
    /// Lower threshold (crossing it downward releases).
    pub low: f64,
}

/// Quirk properties for one device, with every field defaulting to "unknown"/absent
/// so a host without a quirks database still gets workable fallbacks (§6.1).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceQuirks {
    /// Lid switch reliability.
    pub lid_switch_reliability: LidSwitchReliability,
    /// Palm-rejection pressure threshold, if known.
    pub palm_pressure_threshold: Option<f64>,
    /// Palm-rejection touch-size threshold, if known.
    pub palm_size_threshold: Option<f64>,
    /// Pressure-based touch detection hi/lo range.
    pub pressure_range: Option<Threshold>,
    /// Touch-size-based touch detection hi/lo range.
    pub touch_size_range: Option<Threshold>,
    /// Touchpad/keyboard combo layout.
    pub tpkbcombo_layout: TpkbComboLayout,
    /// Thumb-detection pressure threshold, if known.
    pub thumb_pressure_threshold: Option<f64>,
    /// Thumb-detection touch-size threshold, if known.
    pub thumb_size_threshold: Option<f64>,
    /// Device is a model-specific special case (Apple, Wacom, Synaptics-serial, etc.)
    /// that the host's quirks DB tags for its own downstream handling.
    pub is_tagged_model: bool,
}

/// A minimal device identity, enough for a quirks lookup to match against vid/pid/
/// name/bustype without this crate needing to know how the match is performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Kernel input device name string.
    pub name: String,
    /// USB/Bluetooth/etc bus type, as in `input_id.bustype`.
    pub bus_type: u16,
    /// Vendor id.
    pub vendor: u16,
    /// Product id.
    pub product: u16,
    /// Firmware/version id.
    pub version: u16,
}

/// A host-provided quirks database (§6.1). The library ships no implementation; hosts
/// without a real quirks DB can use [`NoQuirks`].
pub trait QuirksTable {
    /// Look up quirk properties for `device`.
    fn lookup(&self, device: &DeviceInfo) -> DeviceQuirks;
}

/// A [`QuirksTable`] that knows nothing about any device, returning [`DeviceQuirks`]'s
/// all-unknown default for everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQuirks;

impl QuirksTable for NoQuirks {
    fn lookup(&self, _device: &DeviceInfo) -> DeviceQuirks {
        DeviceQuirks::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_quirks_returns_default() {
        let info = DeviceInfo {
            name: "Test Device".into(),
            bus_type: 0,
            vendor: 0,
            product: 0,
            version: 0,
        };
        assert_eq!(NoQuirks.lookup(&info), DeviceQuirks::default());
    }

    #[test]
    fn defaults_are_all_unknown() {
        let quirks = DeviceQuirks::default();
        assert_eq!(
            quirks.lid_switch_reliability,
            LidSwitchReliability::Unknown
        );
        assert!(quirks.palm_pressure_threshold.is_none());
        assert!(!quirks.is_tagged_model);
    }
}
