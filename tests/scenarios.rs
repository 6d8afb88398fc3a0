//! End-to-end scenarios driven entirely through the public `Dispatch` entry points,
//! feeding raw kernel-shaped tuples the way a host would.

use evdev::{AbsoluteAxisType, Key, RelativeAxisType};

use libopeninput_core::arbitration::Arbitration;
use libopeninput_core::device::{AbsKind, Device, DeviceIdentity, InputProps};
use libopeninput_core::dispatch::fallback::{RawEvent, RawEventKind};
use libopeninput_core::dispatch::touchpad::palm::EdgeZone;
use libopeninput_core::dispatch::{fallback_dispatch, touchpad_dispatch};
use libopeninput_core::event::{Event, KeyState, TouchPhase};
use libopeninput_core::geom::AxisResolution;
use libopeninput_core::hysteresis::Margin;
use libopeninput_core::quirks::DeviceQuirks;
use libopeninput_core::seat::{DeviceId, Seat};
use libopeninput_core::time::Micros;

fn init_logging() {
    let _ = pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn raw(kind: RawEventKind, code: u16, value: i32, micros: u64) -> RawEvent {
    RawEvent {
        kind,
        code,
        value,
        time: Micros(micros),
    }
}

fn syn(micros: u64) -> RawEvent {
    raw(RawEventKind::Sync, 0, 0, micros)
}

fn mouse() -> Device {
    Device::new(
        DeviceId(0),
        "Test Mouse",
        DeviceIdentity::default(),
        InputProps::empty(),
        AbsKind::None,
        DeviceQuirks::default(),
    )
}

/// S1 — fallback mouse motion with a button press and release.
#[test]
fn s1_fallback_mouse_motion_with_button() {
    init_logging();
    let mut dispatch = fallback_dispatch(true, None);
    let mut device = mouse();
    let mut seat = Seat::new("seat0");
    let arbitration = Arbitration::new();
    let mut out = Vec::new();

    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Relative, RelativeAxisType::REL_X.0, -1, 0), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Relative, RelativeAxisType::REL_Y.0, -1, 0), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(0), &arbitration, &mut out);

    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Relative, RelativeAxisType::REL_X.0, -1, 8000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Relative, RelativeAxisType::REL_Y.0, -1, 8000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Key, Key::BTN_LEFT.0, 1, 8000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(8000), &arbitration, &mut out);

    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Key, Key::BTN_LEFT.0, 0, 20_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(20_000), &arbitration, &mut out);

    let motions = out.iter().filter(|e| matches!(e, Event::PointerMotion { .. })).count();
    let presses = out
        .iter()
        .filter(|e| matches!(e, Event::PointerButton { state: KeyState::Pressed, .. }))
        .count();
    let releases = out
        .iter()
        .filter(|e| matches!(e, Event::PointerButton { state: KeyState::Released, .. }))
        .count();
    assert_eq!(motions, 2);
    assert_eq!(presses, 1);
    assert_eq!(releases, 1);
}

/// S2 — a bouncing release-then-press within the debounce window. On the first
/// occurrence (debouncing not yet armed) the press and release both pass through
/// normally; the immediate retrigger press is what gets filtered, and that bounce
/// is what arms debouncing for the rest of the device's session.
#[test]
fn s2_first_bounce_learns_before_filtering() {
    init_logging();
    let mut dispatch = fallback_dispatch(true, None);
    let mut device = mouse();
    let mut seat = Seat::new("seat0");
    let arbitration = Arbitration::new();
    let mut out = Vec::new();

    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Key, Key::BTN_LEFT.0, 1, 0), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Key, Key::BTN_LEFT.0, 0, 1_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Key, Key::BTN_LEFT.0, 1, 3_000), &arbitration, &mut out);

    let presses = out
        .iter()
        .filter(|e| matches!(e, Event::PointerButton { state: KeyState::Pressed, .. }))
        .count();
    let releases = out
        .iter()
        .filter(|e| matches!(e, Event::PointerButton { state: KeyState::Released, .. }))
        .count();
    assert_eq!(presses, 1, "the retrigger press must be filtered as bounce");
    assert_eq!(releases, 1, "the first release is delivered before bouncing is learned");
}

fn touchpad_device() -> Device {
    let mut device = Device::new(
        DeviceId(1),
        "Test Touchpad",
        DeviceIdentity::default(),
        InputProps::empty(),
        AbsKind::MultiTouch { slot_count: 2 },
        DeviceQuirks::default(),
    );
    device.x_axis.resolution = 20;
    device.y_axis.resolution = 20;
    device
}

/// S3 — a single MT touch with a tracking-id toggle: down, one motion, up.
#[test]
fn s3_mt_touch_tracking_id_toggle() {
    init_logging();
    let mut dispatch = touchpad_dispatch(
        2,
        AxisResolution::from_raw(20, 20),
        Margin { a: 2.0, b: 2.0 },
        EdgeZone {
            side_fraction: 0.08,
            top_fraction: 0.05,
            width: 2000,
            height: 1000,
        },
        false,
    );
    let mut device = touchpad_device();
    let mut seat = Seat::new("seat0");
    let arbitration = Arbitration::new();
    let mut out = Vec::new();

    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_SLOT.0, 0, 0), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_TRACKING_ID.0, 100, 0), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_X.0, 500, 0), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_Y.0, 500, 0), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(0), &arbitration, &mut out);
    assert!(out.iter().any(|e| matches!(e, Event::Touch { phase: TouchPhase::Down, .. })));
    assert!(out.iter().any(|e| matches!(e, Event::Touch { phase: TouchPhase::Frame, .. })));

    out.clear();
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_X.0, 520, 8_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(8_000), &arbitration, &mut out);
    assert!(out.iter().any(|e| matches!(e, Event::Touch { phase: TouchPhase::Motion, .. })));

    out.clear();
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_TRACKING_ID.0, -1, 16_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(16_000), &arbitration, &mut out);
    assert!(out.iter().any(|e| matches!(e, Event::Touch { phase: TouchPhase::Up, .. })));
    assert_eq!(seat.slot_map_ref().count(), 0, "the seat slot must be released on touch up");
}

fn sample_touchpad_dispatch() -> libopeninput_core::Dispatch {
    touchpad_dispatch(
        2,
        AxisResolution::from_raw(20, 20),
        Margin { a: 2.0, b: 2.0 },
        EdgeZone {
            side_fraction: 0.08,
            top_fraction: 0.05,
            width: 2000,
            height: 1000,
        },
        false,
    )
}

/// S5 — a touch begun within the disable-while-typing window emits no pointer
/// motion; one begun after the window times out does.
#[test]
fn s5_dwt_suppresses_pointer_motion_until_timeout() {
    init_logging();
    let mut dispatch = sample_touchpad_dispatch();
    let mut device = touchpad_device();
    let mut seat = Seat::new("seat0");
    let mut arbitration = Arbitration::new();
    let mut out = Vec::new();

    arbitration.feed_keyboard_key(Key::KEY_A.0, Micros(0));

    // First touch: begins at 50ms, well within the 200ms DWT window.
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_SLOT.0, 0, 50_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_TRACKING_ID.0, 1, 50_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_X.0, 500, 50_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_Y.0, 500, 50_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(50_000), &arbitration, &mut out);

    out.clear();
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_X.0, 520, 58_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(58_000), &arbitration, &mut out);
    assert!(
        !out.iter().any(|e| matches!(e, Event::PointerMotion { .. })),
        "motion while typing must be suppressed"
    );

    out.clear();
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_TRACKING_ID.0, -1, 100_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(100_000), &arbitration, &mut out);

    // Second touch: begins at 300ms, after the DWT timeout has elapsed.
    out.clear();
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_SLOT.0, 0, 300_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_TRACKING_ID.0, 2, 300_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_X.0, 500, 300_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_Y.0, 500, 300_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(300_000), &arbitration, &mut out);

    out.clear();
    dispatch.process(&mut device, &mut seat, raw(RawEventKind::Absolute, AbsoluteAxisType::ABS_MT_POSITION_X.0, 520, 308_000), &arbitration, &mut out);
    dispatch.process(&mut device, &mut seat, syn(308_000), &arbitration, &mut out);
    assert!(
        out.iter().any(|e| matches!(e, Event::PointerMotion { .. })),
        "motion after the DWT timeout must reach the pointer"
    );
}
