//! Per-device runtime configuration (§6 "Configuration per device").
//!
//! Setters return [`ConfigStatus`], mirroring `libinput_device_config_*_set`'s
//! success/unsupported/invalid return convention (§6.1) rather than `Result` — an
//! out-of-range value is a normal, expected outcome, not an error condition.

use crate::error::ConfigStatus;

/// Tap-to-click finger-to-button mapping (§6 `tap.map`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapMap {
    /// 1/2/3 fingers map to left/right/middle.
    Lrm,
    /// 1/2/3 fingers map to left/middle/right.
    Lmr,
}

/// Scroll method (§6 `scroll.method`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMethod {
    /// Scrolling is disabled.
    None,
    /// Two-finger vertical/horizontal scroll.
    TwoFinger,
    /// Edge scrolling.
    Edge,
    /// Scroll while a button is held.
    ButtonDown,
}

/// Click-generation method for clickpads (§6 `click.method`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMethod {
    /// Number of fingers determines the button.
    ClickFinger,
    /// Click location on the pad determines the button.
    ButtonAreas,
}

/// Acceleration profile selector (§6 `accel.profile`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelProfileKind {
    /// The device-appropriate default curve (linear/touchpad/trackpoint).
    Adaptive,
    /// A constant multiplier, no speed-dependent curve.
    Flat,
    /// A user-supplied piecewise-linear curve.
    DeviceSpeedCurve,
}

/// A 2x3 affine calibration matrix applied to absolute coordinates before output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationMatrix(pub [f32; 6]);

impl Default for CalibrationMatrix {
    fn default() -> Self {
        Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }
}

/// Tap-to-click settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapConfig {
    /// Tap-to-click enabled.
    pub enabled: bool,
    /// Finger count to button mapping.
    pub map: TapMap,
    /// Tap-and-drag enabled.
    pub drag: bool,
    /// Drag lock (pause without releasing) enabled.
    pub drag_lock: bool,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            map: TapMap::Lrm,
            drag: false,
            drag_lock: false,
        }
    }
}

/// Scroll settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollConfig {
    /// Active scroll method.
    pub method: ScrollMethod,
    /// Natural (reversed) scroll direction.
    pub natural: bool,
    /// Button used for `ButtonDown` scrolling.
    pub button: u16,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            method: ScrollMethod::None,
            natural: false,
            button: 0,
        }
    }
}

/// Full per-device configuration (§6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceConfig {
    /// Tap-to-click settings.
    pub tap: TapConfig,
    /// Scroll settings.
    pub scroll: ScrollConfig,
    /// Click method for clickpads.
    pub click_method: ClickMethod,
    /// Acceleration speed adjustment, `[-1, 1]`.
    pub accel_speed: f64,
    /// Acceleration profile kind.
    pub accel_profile: AccelProfileKind,
    /// Left-handed mode (swaps left/right buttons at emit time, §9).
    pub left_handed: bool,
    /// Middle-button emulation from simultaneous left+right click.
    pub middle_emulation: bool,
    /// Output rotation in degrees, applied to relative motion.
    pub rotation_angle: u16,
    /// Disable-while-typing enabled.
    pub dwt: bool,
    /// Whether events from this device are currently being delivered.
    pub send_events: SendEventsMode,
    /// Absolute-coordinate calibration matrix.
    pub calibration_matrix: CalibrationMatrix,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            tap: TapConfig::default(),
            scroll: ScrollConfig::default(),
            click_method: ClickMethod::ClickFinger,
            accel_speed: 0.0,
            accel_profile: AccelProfileKind::Adaptive,
            left_handed: false,
            middle_emulation: false,
            rotation_angle: 0,
            dwt: true,
            send_events: SendEventsMode::Enabled,
            calibration_matrix: CalibrationMatrix::default(),
        }
    }
}

/// Send-events mode (§4.8.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendEventsMode {
    /// Events are delivered normally.
    Enabled,
    /// Events are never delivered.
    Disabled,
    /// Events are suppressed only while an external mouse is present.
    DisabledOnExternalMouse,
}

impl DeviceConfig {
    /// Set `accel.speed`, validating the `[-1, 1]` range (§6).
    pub fn set_accel_speed(&mut self, speed: f64) -> ConfigStatus {
        if !(-1.0..=1.0).contains(&speed) {
            return ConfigStatus::Invalid;
        }
        self.accel_speed = speed;
        ConfigStatus::Success
    }

    /// Set `rotation.angle`, validating `0..360`.
    pub fn set_rotation_angle(&mut self, degrees: u16) -> ConfigStatus {
        if degrees >= 360 {
            return ConfigStatus::Invalid;
        }
        self.rotation_angle = degrees;
        ConfigStatus::Success
    }

    /// Enable or disable tap-to-click. Always succeeds; whether tapping is physically
    /// possible on this device is a capability check the host performs before calling,
    /// per libinput's own split between `_is_available` and `_set_enabled`.
    pub fn set_tap_enabled(&mut self, enabled: bool) -> ConfigStatus {
        self.tap.enabled = enabled;
        ConfigStatus::Success
    }

    /// Set the scroll method.
    pub fn set_scroll_method(&mut self, method: ScrollMethod) -> ConfigStatus {
        self.scroll.method = method;
        ConfigStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accel_speed_rejects_out_of_range() {
        let mut config = DeviceConfig::default();
        assert_eq!(config.set_accel_speed(2.0), ConfigStatus::Invalid);
        assert_eq!(config.accel_speed, 0.0);
    }

    #[test]
    fn accel_speed_accepts_in_range() {
        let mut config = DeviceConfig::default();
        assert_eq!(config.set_accel_speed(0.5), ConfigStatus::Success);
        assert_eq!(config.accel_speed, 0.5);
    }

    #[test]
    fn rotation_angle_rejects_360_and_above() {
        let mut config = DeviceConfig::default();
        assert_eq!(config.set_rotation_angle(360), ConfigStatus::Invalid);
    }

    #[test]
    fn default_config_has_dwt_enabled() {
        assert!(DeviceConfig::default().dwt);
    }
}
