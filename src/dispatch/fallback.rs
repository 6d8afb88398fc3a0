//! Fallback dispatch (§4.5): the per-event-type handling shared by simple pointer,
//! keyboard and switch devices — everything that isn't a touchpad.
//!
//! Grounded on `original_source/src/evdev-fallback.c`'s `evdev_process_relative`/
//! `evdev_process_absolute`/`evdev_process_key`/`evdev_process_switch`/
//! `evdev_sync_device` functions, each mirrored here as a `handle_*` method.

use evdev::{AbsoluteAxisType, Key, RelativeAxisType};

use crate::debounce::{Action as DebounceAction, Debouncer};
use crate::device::{AbsKind, Device};
use crate::error::{RateLimitDecision, RateLimiter};
use crate::event::{AxisBitmap, AxisSource, AxisValue, Event, KeyState, Switch, TouchPhase};
use crate::key::{self, KeyType};
use crate::lid::{LidAction, LidSwitch};
use crate::seat::{DeviceId, Seat};
use crate::time::Micros;

/// A decoded kernel event, already classified by type (§6 "decoded evdev events").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEvent {
    /// Which kernel event type this is.
    pub kind: RawEventKind,
    /// Kernel code within that type.
    pub code: u16,
    /// Kernel value.
    pub value: i32,
    /// Monotonic timestamp.
    pub time: Micros,
}

/// Kernel `EV_*` type, decoded by the host before handing events to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    /// `EV_REL`.
    Relative,
    /// `EV_ABS`.
    Absolute,
    /// `EV_KEY`.
    Key,
    /// `EV_SW`.
    Switch,
    /// `EV_SYN`.
    Sync,
}

/// Default wheel click angle in degrees, matching common mouse wheel detents.
const DEFAULT_WHEEL_CLICK_ANGLE: f64 = 15.0;
/// Kernel "key repeat" value, dropped unconditionally (§4.5).
const KEY_VALUE_REPEAT: i32 = 2;

/// A rotation applied to relative deltas before filtering (§4.5 "Rotation"),
/// restricted to 90° multiples as used for trackballs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// Rotate 90° clockwise.
    Deg90,
    /// Rotate 180°.
    Deg180,
    /// Rotate 270° clockwise.
    Deg270,
}

impl Rotation {
    fn apply(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::None => (x, y),
            Self::Deg90 => (-y, x),
            Self::Deg180 => (-x, -y),
            Self::Deg270 => (y, -x),
        }
    }
}

/// Which kind of semantic event is pending flush at the next `SYN_REPORT` (§9
/// "accumulator / pending-event pattern" — a single value, not a queue).
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingEvent {
    RelativeMotion { dx: f64, dy: f64 },
    AbsoluteMotion { x: i32, y: i32 },
    TouchDown,
    TouchUp,
}

/// Transient fallback-dispatch state for one device: everything §4.5 needs beyond
/// what [`Device`] already owns.
#[derive(Debug)]
pub struct FallbackDispatch {
    rotation: Rotation,
    pending: Option<PendingEvent>,
    debouncer: Debouncer,
    non_pointer_rel_limiter: RateLimiter,
    lid: Option<LidSwitch>,
    wheel_click_angle: f64,
    is_pointer: bool,
    single_touch_down: bool,
}

impl FallbackDispatch {
    /// Build fallback dispatch state. `is_pointer` gates the REL_X/Y rejection rule;
    /// `lid` is `Some` only for devices that report `SW_LID`/`SW_TABLET_MODE`.
    #[must_use]
    pub fn new(is_pointer: bool, lid: Option<LidSwitch>) -> Self {
        Self {
            rotation: Rotation::None,
            pending: None,
            debouncer: Debouncer::new(),
            non_pointer_rel_limiter: RateLimiter::new(10_000_000, 1),
            lid,
            wheel_click_angle: DEFAULT_WHEEL_CLICK_ANGLE,
            is_pointer,
            single_touch_down: false,
        }
    }

    /// Pair a keyboard with this device's lid switch, if it has one (§4.7). Returns
    /// `false` if this device carries no lid or the pairing table is already full.
    pub fn pair_keyboard(&mut self, keyboard: DeviceId) -> bool {
        self.lid.as_mut().is_some_and(|lid| lid.pair_keyboard(keyboard))
    }

    /// Set the rotation matrix applied to relative deltas.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Handle one decoded kernel event, appending any resulting semantic events to
    /// `out`. Returns nothing; flushing happens on `SYN_REPORT`.
    pub fn handle(
        &mut self,
        device: &mut Device,
        seat: &mut Seat,
        raw: RawEvent,
        out: &mut Vec<Event>,
    ) {
        match raw.kind {
            RawEventKind::Relative => self.handle_relative(device, raw, out),
            RawEventKind::Absolute => self.handle_absolute(device, raw),
            RawEventKind::Key => self.handle_key(device, raw, out),
            RawEventKind::Switch => self.handle_switch(device, raw, out),
            RawEventKind::Sync => {
                if raw.code == 0 {
                    self.flush(device, seat, raw.time, out);
                }
            }
        }
    }

    fn handle_relative(&mut self, device: &mut Device, raw: RawEvent, out: &mut Vec<Event>) {
        if !self.is_pointer {
            if self.non_pointer_rel_limiter.check(raw.time) != RateLimitDecision::Suppress {
                log::warn!(
                    "device {:?} is not a pointer but sent REL code {}",
                    device.id,
                    raw.code
                );
            }
            return;
        }

        let wheel = raw.code == RelativeAxisType::REL_WHEEL.0;
        let hwheel = raw.code == RelativeAxisType::REL_HWHEEL.0;
        if wheel || hwheel {
            // Wheel events flush the frame immediately and bypass the pending
            // relative-motion accumulator entirely (§4.5).
            let discrete = f64::from(raw.value);
            let degrees = discrete * self.wheel_click_angle * if wheel { -1.0 } else { 1.0 };
            out.push(Event::PointerAxis {
                device: device.id,
                time: raw.time,
                axes: AxisBitmap {
                    vertical: wheel,
                    horizontal: hwheel,
                },
                source: AxisSource::Wheel,
                vertical: if wheel {
                    AxisValue { degrees, discrete }
                } else {
                    AxisValue::default()
                },
                horizontal: if hwheel {
                    AxisValue { degrees, discrete }
                } else {
                    AxisValue::default()
                },
            });
            return;
        }

        let (dx, dy) = match self.pending.take() {
            Some(PendingEvent::RelativeMotion { dx, dy }) => (dx, dy),
            other => {
                self.pending = other;
                (0.0, 0.0)
            }
        };
        let value = f64::from(raw.value);
        let (dx, dy) = if raw.code == RelativeAxisType::REL_X.0 {
            (dx + value, dy)
        } else if raw.code == RelativeAxisType::REL_Y.0 {
            (dx, dy + value)
        } else {
            (dx, dy)
        };
        self.pending = Some(PendingEvent::RelativeMotion { dx, dy });
    }

    fn handle_absolute(&mut self, device: &mut Device, raw: RawEvent) {
        match device.abs_kind {
            AbsKind::MultiTouch { .. } => self.handle_mt_absolute(device, raw),
            AbsKind::SingleTouch => {
                if raw.code == AbsoluteAxisType::ABS_X.0 {
                    device.x_axis.value = raw.value;
                } else if raw.code == AbsoluteAxisType::ABS_Y.0 {
                    device.y_axis.value = raw.value;
                }
                self.pending = Some(PendingEvent::AbsoluteMotion {
                    x: device.x_axis.value,
                    y: device.y_axis.value,
                });
            }
            AbsKind::None => {}
        }
    }

    fn handle_mt_absolute(&mut self, device: &mut Device, raw: RawEvent) {
        let Some(slots) = device.slots.as_mut() else {
            return;
        };
        if raw.code == AbsoluteAxisType::ABS_MT_SLOT.0 {
            slots.select(raw.value);
        } else if raw.code == AbsoluteAxisType::ABS_MT_TRACKING_ID.0 {
            slots.tracking_id(raw.value);
        } else if raw.code == AbsoluteAxisType::ABS_MT_POSITION_X.0 {
            let y = slots.active().point.y;
            slots.position(crate::geom::DeviceCoords::new(raw.value, y));
        } else if raw.code == AbsoluteAxisType::ABS_MT_POSITION_Y.0 {
            let x = slots.active().point.x;
            slots.position(crate::geom::DeviceCoords::new(x, raw.value));
        }
    }

    fn handle_key(&mut self, device: &mut Device, raw: RawEvent, out: &mut Vec<Event>) {
        if raw.value == KEY_VALUE_REPEAT {
            return;
        }
        let pressed = raw.value != 0;

        if raw.code == Key::BTN_TOUCH.0 && matches!(device.abs_kind, AbsKind::SingleTouch) {
            self.single_touch_down = pressed;
            self.pending = Some(if pressed {
                PendingEvent::TouchDown
            } else {
                PendingEvent::TouchUp
            });
            return;
        }

        match key::classify(raw.code) {
            KeyType::None => {}
            KeyType::Key => self.handle_plain_key(device, raw, pressed, out),
            KeyType::Button => self.handle_button(device, raw, pressed, out),
        }
    }

    fn handle_plain_key(
        &mut self,
        device: &mut Device,
        raw: RawEvent,
        pressed: bool,
        out: &mut Vec<Event>,
    ) {
        let accepted = if pressed {
            device.keys.press(raw.code)
        } else {
            device.keys.release(raw.code)
        };
        if !accepted {
            return;
        }
        out.push(Event::KeyboardKey {
            device: device.id,
            time: raw.time,
            code: raw.code,
            state: if pressed {
                KeyState::Pressed
            } else {
                KeyState::Released
            },
        });
    }

    fn handle_button(
        &mut self,
        device: &mut Device,
        raw: RawEvent,
        pressed: bool,
        out: &mut Vec<Event>,
    ) {
        let action = if pressed {
            self.debouncer.press(raw.code, raw.time)
        } else {
            self.debouncer.release(raw.code, raw.time)
        };
        match action {
            DebounceAction::Emit => self.emit_button(device, raw.code, raw.time, pressed, out),
            DebounceAction::Drop => {}
            DebounceAction::Hold { .. } => {}
            DebounceAction::FlushThenEmit { held_button, held_at } => {
                self.emit_button(device, held_button, held_at, false, out);
                self.emit_button(device, raw.code, raw.time, pressed, out);
            }
        }
    }

    /// Emit the debounce timer's held-back release once the host's timer wheel fires
    /// the `TimerPurpose::Debounce` entry for this device (§4.6 "on timer expiry,
    /// emit the held-back release").
    pub fn flush_debounced_release(&mut self, device: &mut Device, button: u16, out: &mut Vec<Event>) {
        if let Some(at) = self.debouncer.timer_expired() {
            self.emit_button(device, button, at, false, out);
        }
    }

    fn emit_button(
        &self,
        device: &mut Device,
        code: u16,
        time: Micros,
        pressed: bool,
        out: &mut Vec<Event>,
    ) {
        // Hardware-key-held state always tracks the raw kernel code; the left-handed
        // swap is applied only at the emitted-event boundary, never mid-press.
        let accepted = if pressed {
            device.keys.press(code)
        } else {
            device.keys.release(code)
        };
        if !accepted {
            return;
        }
        let emitted_code = if device.config.left_handed {
            swap_left_right(code)
        } else {
            code
        };
        let seat_button_count = device.keys.iter_held().count() as u32;
        out.push(Event::PointerButton {
            device: device.id,
            time,
            button: emitted_code,
            state: if pressed {
                KeyState::Pressed
            } else {
                KeyState::Released
            },
            seat_button_count,
        });
    }

    fn handle_switch(&mut self, device: &mut Device, raw: RawEvent, out: &mut Vec<Event>) {
        const SW_LID: u16 = 0;
        const SW_TABLET_MODE: u16 = 1;
        let closed = raw.value != 0;

        if raw.code == SW_LID {
            if let Some(lid) = self.lid.as_mut() {
                match lid.switch_event(closed) {
                    LidAction::None => {}
                    LidAction::Emit(state) => out.push(Event::SwitchToggle {
                        device: device.id,
                        time: raw.time,
                        switch: Switch::Lid,
                        state: switch_key_state(state),
                    }),
                    LidAction::ForceOpen { .. } => {}
                }
            }
        } else if raw.code == SW_TABLET_MODE {
            out.push(Event::SwitchToggle {
                device: device.id,
                time: raw.time,
                switch: Switch::TabletMode,
                state: if closed {
                    KeyState::Pressed
                } else {
                    KeyState::Released
                },
            });
        }
    }

    fn flush(
        &mut self,
        device: &mut Device,
        seat: &mut Seat,
        time: Micros,
        out: &mut Vec<Event>,
    ) {
        match self.pending.take() {
            Some(PendingEvent::RelativeMotion { dx, dy }) => {
                let (dx, dy) = self.rotation.apply(dx, dy);
                let unaccelerated = crate::geom::NormalizedCoords::new(dx, dy);
                out.push(Event::PointerMotion {
                    device: device.id,
                    time,
                    accelerated: unaccelerated,
                    unaccelerated,
                });
            }
            Some(PendingEvent::AbsoluteMotion { x, y }) => {
                out.push(Event::PointerMotionAbsolute {
                    device: device.id,
                    time,
                    point: crate::geom::DeviceCoords::new(x, y),
                });
                if self.single_touch_down {
                    self.emit_single_touch_frame(device, seat, time, TouchPhase::Motion, out);
                }
            }
            Some(PendingEvent::TouchDown) => {
                self.emit_single_touch_frame(device, seat, time, TouchPhase::Down, out);
            }
            Some(PendingEvent::TouchUp) => {
                self.emit_single_touch_frame(device, seat, time, TouchPhase::Up, out);
            }
            None => {}
        }
    }

    fn emit_single_touch_frame(
        &self,
        device: &mut Device,
        seat: &mut Seat,
        time: Micros,
        phase: TouchPhase,
        out: &mut Vec<Event>,
    ) {
        let Some(slots) = device.slots.as_mut() else {
            return;
        };
        let slot = slots.active_mut();
        let seat_slot = match phase {
            TouchPhase::Down => {
                let allocated = seat.slot_map().allocate();
                slot.seat_slot = allocated;
                allocated
            }
            TouchPhase::Up => {
                let released = slot.seat_slot.take();
                if let Some(s) = released {
                    seat.slot_map().release(s);
                }
                released
            }
            _ => slot.seat_slot,
        };
        out.push(Event::Touch {
            device: device.id,
            time,
            slot: 0,
            seat_slot,
            point: Some(slot.point),
            phase,
        });
        out.push(Event::Touch {
            device: device.id,
            time,
            slot: 0,
            seat_slot,
            point: None,
            phase: TouchPhase::Frame,
        });
    }

    /// Suspend the device: synthesize releases for every held key/button and down
    /// touch (§4.5 "on suspend... released synthetically with the current
    /// timestamp").
    pub fn suspend(
        &mut self,
        device: &mut Device,
        seat: &mut Seat,
        time: Micros,
        out: &mut Vec<Event>,
    ) {
        let held: Vec<u16> = device.keys.iter_held().collect();
        for code in held {
            self.emit_button(device, code, time, false, out);
        }
        if self.single_touch_down {
            self.single_touch_down = false;
            self.emit_single_touch_frame(device, seat, time, TouchPhase::Up, out);
        }
        device.keys.clear();
        device.suspended = true;
    }
}

fn switch_key_state(state: crate::lid::LidState) -> KeyState {
    match state {
        crate::lid::LidState::Closed => KeyState::Pressed,
        crate::lid::LidState::Open => KeyState::Released,
    }
}

fn swap_left_right(code: u16) -> u16 {
    if code == Key::BTN_LEFT.0 {
        Key::BTN_RIGHT.0
    } else if code == Key::BTN_RIGHT.0 {
        Key::BTN_LEFT.0
    } else {
        code
    }
}
