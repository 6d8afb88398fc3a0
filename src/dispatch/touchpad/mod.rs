//! Touchpad dispatch (§4.8): the `pre_process → process → post_events →
//! post_process` pipeline over a frame's dirty MT slots.
//!
//! Grounded on `original_source/src/evdev-mt-touchpad.c`'s `tp_handle_state`, which
//! names exactly these four phases.

pub mod jitter;
pub mod palm;
pub mod thumb;

use evdev::{AbsoluteAxisType, Key};
use smallvec::SmallVec;

use crate::accel::touchpad::TouchpadProfile;
use crate::accel::AccelFilter;
use crate::arbitration::Arbitration;
use crate::debounce::{Action as DebounceAction, Debouncer};
use crate::device::Device;
use crate::event::{Event, KeyState, TouchPhase};
use crate::geom::{AxisResolution, DeviceCoords, DeviceFloatCoords};
use crate::hysteresis::{HysteresisFilter, Margin};
use crate::mt::TouchLifecycle;
use crate::seat::Seat;
use crate::time::Micros;

use super::fallback::{RawEvent, RawEventKind};
use self::palm::{EdgeZone, PalmTracker};
use self::thumb::{MultifingerDetector, ThumbState};

/// Maps a `BTN_TOOL_FINGER..QUINTTAP` kernel code to its fake-finger bit index
/// (§4.4); these codes are not contiguous in the kernel's numbering.
fn fake_finger_bit(code: u16) -> Option<u8> {
    match code {
        c if c == Key::BTN_TOOL_FINGER.0 => Some(0),
        c if c == Key::BTN_TOOL_DOUBLETAP.0 => Some(1),
        c if c == Key::BTN_TOOL_TRIPLETAP.0 => Some(2),
        c if c == Key::BTN_TOOL_QUADTAP.0 => Some(3),
        c if c == Key::BTN_TOOL_QUINTTAP.0 => Some(4),
        _ => None,
    }
}

/// Minimum motion, in mm, to unpin a touch after a physical click (§4.8.7).
const UNPIN_THRESHOLD_MM: f64 = 1.5;

/// Per-slot state this dispatch layers on top of [`crate::mt::SlotRecord`]: palm/
/// thumb classification, pinning, and the motion pipeline's own filters.
#[derive(Debug, Clone)]
struct TouchExtra {
    palm: PalmTracker,
    thumb: ThumbState,
    pinned_at: Option<DeviceCoords>,
    previous_point: Option<DeviceCoords>,
    hysteresis: HysteresisFilter,
    jitter: jitter::JitterFilter,
}

impl TouchExtra {
    fn new(time: Micros, point: DeviceCoords, began_in_edge: bool, margin: Margin) -> Self {
        Self {
            palm: PalmTracker::new(time, began_in_edge),
            thumb: ThumbState::Maybe,
            pinned_at: None,
            previous_point: Some(point),
            hysteresis: HysteresisFilter::new(point, margin),
            jitter: jitter::JitterFilter::new(margin),
        }
    }

    fn is_excluded_from_motion(&self) -> bool {
        self.palm.state().is_excluded() || self.thumb == ThumbState::Yes || self.pinned_at.is_some()
    }
}

/// Per-device touchpad dispatch state.
pub struct TouchpadDispatch {
    extras: SmallVec<[Option<TouchExtra>; crate::mt::INLINE_SLOTS]>,
    resolution: AxisResolution,
    margin: Margin,
    edge_zone: EdgeZone,
    accel: AccelFilter<TouchpadProfile>,
    multifinger: SmallVec<[MultifingerDetector; crate::mt::INLINE_SLOTS]>,
    is_clickpad: bool,
    clickpad_button_pressed: bool,
    debouncer: Debouncer,
}

impl TouchpadDispatch {
    /// Build dispatch state for a device with `slot_count` MT slots.
    #[must_use]
    pub fn new(
        slot_count: usize,
        resolution: AxisResolution,
        margin: Margin,
        edge_zone: EdgeZone,
        is_clickpad: bool,
    ) -> Self {
        Self {
            extras: smallvec::smallvec![None; slot_count],
            resolution,
            margin,
            edge_zone,
            accel: AccelFilter::new(TouchpadProfile::new()),
            multifinger: smallvec::smallvec![MultifingerDetector::new(); slot_count],
            is_clickpad,
            clickpad_button_pressed: false,
            debouncer: Debouncer::new(),
        }
    }

    /// Decode one raw kernel event: `ABS_MT_*` feeds the slot table, `BTN_TOOL_*`
    /// feeds the fake-finger bitmap, `BTN_LEFT/RIGHT/MIDDLE` go through the same
    /// debounce machinery the fallback dispatch uses, and `SYN_REPORT` runs the frame
    /// pipeline.
    pub fn handle(
        &mut self,
        device: &mut Device,
        seat: &mut Seat,
        raw: RawEvent,
        arbitration: &Arbitration,
        out: &mut Vec<Event>,
    ) {
        match raw.kind {
            RawEventKind::Absolute => {
                if let Some(slots) = device.slots.as_mut() {
                    if raw.code == AbsoluteAxisType::ABS_MT_SLOT.0 {
                        slots.select(raw.value);
                    } else if raw.code == AbsoluteAxisType::ABS_MT_TRACKING_ID.0 {
                        slots.tracking_id(raw.value);
                    } else if raw.code == AbsoluteAxisType::ABS_MT_POSITION_X.0 {
                        let y = slots.active().point.y;
                        slots.position(DeviceCoords::new(raw.value, y));
                    } else if raw.code == AbsoluteAxisType::ABS_MT_POSITION_Y.0 {
                        let x = slots.active().point.x;
                        slots.position(DeviceCoords::new(x, raw.value));
                    }
                }
            }
            RawEventKind::Key => {
                if let Some(bit) = fake_finger_bit(raw.code) {
                    if let Some(slots) = device.slots.as_mut() {
                        slots.fake_fingers_mut().set_bit(bit, raw.value != 0);
                    }
                    return;
                }
                self.handle_button(device, raw, out);
            }
            RawEventKind::Sync if raw.code == 0 => {
                self.handle_state(device, seat, raw.time, arbitration, out);
            }
            _ => {}
        }
    }

    fn handle_button(&mut self, device: &mut Device, raw: RawEvent, out: &mut Vec<Event>) {
        let pressed = raw.value != 0;
        if raw.code == Key::BTN_LEFT.0 {
            self.on_clickpad_button(pressed);
        }
        let action = if pressed {
            self.debouncer.press(raw.code, raw.time)
        } else {
            self.debouncer.release(raw.code, raw.time)
        };
        match action {
            DebounceAction::Emit => emit_button(device, raw.code, raw.time, pressed, out),
            DebounceAction::Drop | DebounceAction::Hold { .. } => {}
            DebounceAction::FlushThenEmit { held_button, held_at } => {
                emit_button(device, held_button, held_at, false, out);
                emit_button(device, raw.code, raw.time, pressed, out);
            }
        }
    }

    /// Emit the debounce timer's held-back button release (§4.6), mirroring
    /// [`super::fallback::FallbackDispatch::flush_debounced_release`].
    pub fn flush_debounced_release(&mut self, device: &mut Device, button: u16, out: &mut Vec<Event>) {
        if let Some(at) = self.debouncer.timer_expired() {
            emit_button(device, button, at, false, out);
        }
    }

    /// Run one frame's `handle_state` pipeline over `device`'s dirty slots, appending
    /// resulting events to `out`.
    pub fn handle_state(
        &mut self,
        device: &mut Device,
        seat: &mut Seat,
        time: Micros,
        arbitration: &Arbitration,
        out: &mut Vec<Event>,
    ) {
        self.pre_process(device, time);
        self.process(device, time, arbitration);
        self.post_events(device, seat, time, out);
        self.post_process(device);
    }

    /// Resurrect any `MaybeEnd` slot the fake-finger count still implies is present,
    /// and gate `Hovering -> Begin` transitions (§4.8.1/§4.8.2).
    fn pre_process(&mut self, device: &mut Device, _time: Micros) {
        let Some(slots) = device.slots.as_mut() else {
            return;
        };
        let finger_count = slots.fake_fingers_mut().count();
        let active_count = slots
            .iter()
            .filter(|s| matches!(s.state, TouchLifecycle::Begin | TouchLifecycle::Update))
            .count();
        let still_present = matches!(finger_count, crate::mt::FingerCount::Count(n) if n as usize > active_count)
            || matches!(finger_count, crate::mt::FingerCount::Overflow);

        for index in 0..slots.len() {
            slots.resurrect(index, still_present);
        }

        for slot in slots.iter_mut() {
            if slot.state == TouchLifecycle::Hovering && slot.dirty {
                slot.state = TouchLifecycle::Begin;
            }
        }
    }

    /// Evaluate palm/thumb/jitter/hysteresis for every dirty, active touch (§4.8.3,
    /// §4.8.4, §4.8.5).
    fn process(&mut self, device: &mut Device, time: Micros, arbitration: &Arbitration) {
        let is_typing = arbitration.is_typing(time);
        let trackpoint_active = arbitration.is_trackpoint_active(time);
        let Some(slots) = device.slots.as_mut() else {
            return;
        };
        let other_touch_active = slots
            .iter()
            .filter(|s| matches!(s.state, TouchLifecycle::Begin | TouchLifecycle::Update))
            .count()
            > 1;
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.state == TouchLifecycle::Begin && self.extras.get(index).map_or(true, Option::is_none) {
                let began_in_edge = self.edge_zone.contains(slot.point.x, slot.point.y);
                if let Some(entry) = self.extras.get_mut(index) {
                    *entry = Some(TouchExtra::new(time, slot.point, began_in_edge, self.margin));
                }
            }

            if let Some(Some(extra)) = self.extras.get_mut(index) {
                // Pressure/touch-size triggers never fire: this crate's slot model
                // carries no ABS_MT_PRESSURE/touch-size data to evaluate them against.
                extra.palm.evaluate(
                    time,
                    None,
                    None,
                    is_typing,
                    trackpoint_active,
                    false,
                    None,
                    None,
                    other_touch_active,
                    true,
                );

                let filtered = extra.hysteresis.filter(slot.point);
                extra.jitter.record_and_check_wobble(
                    f64::from(filtered.x - extra.hysteresis.center().x),
                    time,
                );
                slot.point = extra.jitter.filter(filtered, extra.hysteresis.center());
            }

            if let Some(detector) = self.multifinger.get_mut(index) {
                let y_fraction = f64::from(slot.point.y) / f64::from(self.edge_zone.height.max(1));
                detector.evaluate(time, y_fraction, 0.0, f64::MAX, true);
                if let Some(Some(extra)) = self.extras.get_mut(index) {
                    extra.thumb = detector.state();
                }
            }
        }
    }

    /// Emit touch down/motion/up and, for every active non-excluded touch, a filtered
    /// pointer motion (§4.8.6).
    fn post_events(
        &mut self,
        device: &mut Device,
        seat: &mut Seat,
        time: Micros,
        out: &mut Vec<Event>,
    ) {
        let device_id = device.id;
        let Some(slots) = device.slots.as_mut() else {
            return;
        };
        let mut any_touch_event = false;

        for index in 0..slots.len() {
            let state = slots.iter().nth(index).map(|s| s.state);
            let Some(state) = state else { continue };

            match state {
                TouchLifecycle::Begin => {
                    let slot_ref = slots.iter().nth(index).unwrap();
                    let point = slot_ref.point;
                    let allocated = seat.slot_map().allocate();
                    if let Some(s) = slots.iter_mut().nth(index) {
                        s.seat_slot = allocated;
                    }
                    out.push(Event::Touch {
                        device: device_id,
                        time,
                        slot: index,
                        seat_slot: allocated,
                        point: Some(point),
                        phase: TouchPhase::Down,
                    });
                    any_touch_event = true;
                }
                TouchLifecycle::Update => {
                    let slot_ref = slots.iter().nth(index).unwrap();
                    if !slot_ref.dirty {
                        continue;
                    }
                    let point = slot_ref.point;
                    let seat_slot = slot_ref.seat_slot;
                    let excluded = self
                        .extras
                        .get(index)
                        .and_then(|e| e.as_ref())
                        .is_some_and(TouchExtra::is_excluded_from_motion);

                    if !excluded {
                        if let Some(Some(extra)) = self.extras.get_mut(index) {
                            if let Some(previous) = extra.previous_point {
                                let delta = DeviceFloatCoords::from(point).sub(previous.into());
                                let mm = self.resolution.to_mm(delta);
                                if mm.hypot() <= 20.0 {
                                    let unaccelerated = self.resolution.to_normalized(delta);
                                    let accelerated = self.accel.filter(delta, time);
                                    out.push(Event::PointerMotion {
                                        device: device_id,
                                        time,
                                        accelerated,
                                        unaccelerated,
                                    });
                                }
                            }
                            extra.previous_point = Some(point);
                        }
                    }

                    out.push(Event::Touch {
                        device: device_id,
                        time,
                        slot: index,
                        seat_slot,
                        point: Some(point),
                        phase: TouchPhase::Motion,
                    });
                    any_touch_event = true;
                }
                TouchLifecycle::MaybeEnd => {
                    let slot_ref = slots.iter().nth(index).unwrap();
                    let seat_slot = slot_ref.seat_slot;
                    if let Some(s) = slots.iter_mut().nth(index) {
                        s.seat_slot = None;
                    }
                    if let Some(s) = seat_slot {
                        seat.slot_map().release(s);
                    }
                    out.push(Event::Touch {
                        device: device_id,
                        time,
                        slot: index,
                        seat_slot,
                        point: None,
                        phase: TouchPhase::Up,
                    });
                    any_touch_event = true;
                    if let Some(entry) = self.extras.get_mut(index) {
                        *entry = None;
                    }
                }
                _ => {}
            }
        }

        if any_touch_event {
            out.push(Event::Touch {
                device: device_id,
                time,
                slot: 0,
                seat_slot: None,
                point: None,
                phase: TouchPhase::Frame,
            });
        }
    }

    /// Advance lifecycle states past the frame boundary (§4.8.1: `Begin -> Update`,
    /// `MaybeEnd -> End -> None`) and clear dirty flags, and update pinning (§4.8.7).
    fn post_process(&mut self, device: &mut Device) {
        if self.clickpad_button_pressed {
            if let Some(slots) = device.slots.as_mut() {
                for (index, slot) in slots.iter().enumerate() {
                    if matches!(slot.state, TouchLifecycle::Begin | TouchLifecycle::Update) {
                        if let Some(Some(extra)) = self.extras.get_mut(index) {
                            extra.pinned_at.get_or_insert(slot.point);
                        }
                    }
                }
            }
        }

        for extra_slot in &mut self.extras {
            if let Some(extra) = extra_slot {
                if let Some(pinned_center) = extra.pinned_at {
                    if let Some(current) = extra.previous_point {
                        let delta = DeviceFloatCoords::from(current).sub(pinned_center.into());
                        if self.resolution.to_mm(delta).hypot() > UNPIN_THRESHOLD_MM {
                            extra.pinned_at = None;
                        }
                    }
                }
            }
        }

        let Some(slots) = device.slots.as_mut() else {
            return;
        };
        for slot in slots.iter_mut() {
            slot.state = match slot.state {
                TouchLifecycle::Begin => TouchLifecycle::Update,
                TouchLifecycle::MaybeEnd => TouchLifecycle::None,
                other => other,
            };
        }
        slots.clear_dirty();
    }

    /// Called when `BTN_LEFT` is queued on a clickpad: pin every active touch at its
    /// current position (§4.8.7).
    pub fn on_clickpad_button(&mut self, pressed: bool) {
        self.clickpad_button_pressed = pressed && self.is_clickpad;
    }
}

fn emit_button(device: &mut Device, code: u16, time: Micros, pressed: bool, out: &mut Vec<Event>) {
    // `device.keys` tracks the raw hardware code; left-handed swap is applied only
    // to the code actually put on the wire below.
    let accepted = if pressed {
        device.keys.press(code)
    } else {
        device.keys.release(code)
    };
    if !accepted {
        return;
    }
    let emitted_code = if device.config.left_handed {
        match code {
            c if c == Key::BTN_LEFT.0 => Key::BTN_RIGHT.0,
            c if c == Key::BTN_RIGHT.0 => Key::BTN_LEFT.0,
            other => other,
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{AbsKind, DeviceIdentity, InputProps};
    use crate::quirks::DeviceQuirks;
    use crate::seat::DeviceId;

    fn sample_device() -> Device {
        let mut device = Device::new(
            DeviceId(0),
            "Test Touchpad",
            DeviceIdentity::default(),
            InputProps::BUTTONPAD,
            AbsKind::MultiTouch { slot_count: 2 },
            DeviceQuirks::default(),
        );
        device.x_axis.resolution = 20;
        device.y_axis.resolution = 20;
        device
    }

    fn sample_dispatch() -> TouchpadDispatch {
        TouchpadDispatch::new(
            2,
            AxisResolution::from_raw(20, 20),
            Margin { a: 2.0, b: 2.0 },
            EdgeZone {
                side_fraction: 0.08,
                top_fraction: 0.05,
                width: 2000,
                height: 1000,
            },
            true,
        )
    }

    #[test]
    fn begin_transitions_to_update_after_one_frame() {
        let mut device = sample_device();
        let mut seat = Seat::new("seat0");
        let mut dispatch = sample_dispatch();
        let arbitration = Arbitration::new();
        let mut out = Vec::new();

        {
            let slots = device.slots.as_mut().unwrap();
            slots.select(0);
            slots.tracking_id(1);
            slots.position(DeviceCoords::new(500, 500));
            slots.active_mut().state = TouchLifecycle::Begin;
            slots.active_mut().dirty = true;
        }

        dispatch.handle_state(&mut device, &mut seat, Micros(0), &arbitration, &mut out);

        assert_eq!(
            device.slots.as_ref().unwrap().iter().next().unwrap().state,
            TouchLifecycle::Update
        );
        assert!(out.iter().any(|e| matches!(e, Event::Touch { phase: TouchPhase::Down, .. })));
    }

    #[test]
    fn maybe_end_emits_up_and_releases_seat_slot() {
        let mut device = sample_device();
        let mut seat = Seat::new("seat0");
        let mut dispatch = sample_dispatch();
        let arbitration = Arbitration::new();
        let mut out = Vec::new();

        let seat_slot = seat.slot_map().allocate().unwrap();
        {
            let slots = device.slots.as_mut().unwrap();
            slots.select(0);
            slots.active_mut().state = TouchLifecycle::MaybeEnd;
            slots.active_mut().seat_slot = Some(seat_slot);
        }

        dispatch.handle_state(&mut device, &mut seat, Micros(0), &arbitration, &mut out);

        assert!(!seat.slot_map_ref().is_set(seat_slot));
        assert!(out.iter().any(|e| matches!(e, Event::Touch { phase: TouchPhase::Up, .. })));
    }

    #[test]
    fn clickpad_button_pins_active_touches() {
        let mut device = sample_device();
        let mut seat = Seat::new("seat0");
        let mut dispatch = sample_dispatch();
        let arbitration = Arbitration::new();
        let mut out = Vec::new();

        {
            let slots = device.slots.as_mut().unwrap();
            slots.select(0);
            slots.tracking_id(1);
            slots.position(DeviceCoords::new(500, 500));
            slots.active_mut().state = TouchLifecycle::Begin;
            slots.active_mut().dirty = true;
        }
        dispatch.handle_state(&mut device, &mut seat, Micros(0), &arbitration, &mut out);

        dispatch.on_clickpad_button(true);
        {
            let slots = device.slots.as_mut().unwrap();
            slots.select(0);
            slots.position(DeviceCoords::new(510, 500));
            slots.active_mut().dirty = true;
        }
        out.clear();
        dispatch.handle_state(&mut device, &mut seat, Micros(10_000), &arbitration, &mut out);

        assert!(dispatch.extras[0].as_ref().unwrap().pinned_at.is_some());
    }
}
