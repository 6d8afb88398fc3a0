//! Cross-device arbitration (§4.9): trackpoint activity, disable-while-typing, and
//! external-mouse suspension, all feeding into whether a touchpad's motion/tap/scroll
//! output is currently suppressed.
//!
//! Grounded on `original_source/src/evdev-lid.c`'s pairing-by-`DeviceId` pattern and
//! `original_source/src/libinput-util.c`'s ratelimit window, reused here for the
//! trackpoint activity burst window rather than a log rate limit.

use smallvec::SmallVec;

use crate::key;
use crate::seat::DeviceId;
use crate::time::Micros;

/// Events required within [`TRACKPOINT_BURST_WINDOW_MS`] to count as "active" (§4.9).
const TRACKPOINT_BURST_COUNT: u32 = 3;
/// Window within which the burst must complete.
const TRACKPOINT_BURST_WINDOW_MS: u64 = 40;
/// How long a touchpad stays suppressed once trackpoint activity is confirmed,
/// auto-extended per further event.
const TRACKPOINT_ACTIVE_MS: u64 = 300;
/// DWT timeout after the first qualifying keystroke.
const DWT_FIRST_KEY_MS: u64 = 200;
/// DWT timeout once typing is sustained (a second key arrives before the first window
/// elapses).
const DWT_SUSTAINED_MS: u64 = 500;
/// Kernel key codes below this count as "typing" for DWT purposes; `KEY_F1` and above
/// are assumed to be shortcuts, not prose (§4.9).
const DWT_MAX_CODE: u16 = evdev::Key::KEY_F1.0;

/// Tracks whether a trackpoint has posted enough events in a short enough window to
/// count as actively in use (§4.9 "≥ 3 events within 40 ms").
#[derive(Debug, Clone)]
struct TrackpointActivity {
    burst_start: Option<Micros>,
    burst_count: u32,
    active_until: Option<Micros>,
}

impl TrackpointActivity {
    fn new() -> Self {
        Self {
            burst_start: None,
            burst_count: 0,
            active_until: None,
        }
    }

    fn feed_event(&mut self, time: Micros) {
        if let Some(until) = self.active_until {
            if time <= until {
                // Already active: every further event extends the window.
                self.active_until = Some(time + TRACKPOINT_ACTIVE_MS * 1_000);
                return;
            }
        }

        let window_open = self
            .burst_start
            .is_some_and(|start| time.since(start) <= TRACKPOINT_BURST_WINDOW_MS * 1_000);
        if window_open {
            self.burst_count += 1;
        } else {
            self.burst_start = Some(time);
            self.burst_count = 1;
        }

        if self.burst_count >= TRACKPOINT_BURST_COUNT {
            self.active_until = Some(time + TRACKPOINT_ACTIVE_MS * 1_000);
            self.burst_start = None;
            self.burst_count = 0;
        }
    }

    fn is_active(&self, time: Micros) -> bool {
        self.active_until.is_some_and(|until| time <= until)
    }
}

/// Tracks whether a keyboard is "typing" for DWT purposes (§4.9, §4.8.2's use of the
/// signal to exclude touches begun mid-typing).
#[derive(Debug, Clone, Copy)]
struct TypingActivity {
    typing_until: Option<Micros>,
    key_count: u32,
}

impl TypingActivity {
    fn new() -> Self {
        Self {
            typing_until: None,
            key_count: 0,
        }
    }

    /// Feed a keyboard key-down. Modifier-only presses and codes at or above `KEY_F1`
    /// never arm or extend DWT (§4.8.3, §4.9).
    fn feed_key_down(&mut self, code: u16, time: Micros) {
        if key::is_modifier(code) || code >= DWT_MAX_CODE {
            return;
        }
        let was_typing = self.is_typing(time);
        self.key_count = if was_typing { self.key_count + 1 } else { 1 };
        let timeout_ms = if self.key_count >= 2 {
            DWT_SUSTAINED_MS
        } else {
            DWT_FIRST_KEY_MS
        };
        self.typing_until = Some(time + timeout_ms * 1_000);
    }

    fn is_typing(&self, time: Micros) -> bool {
        self.typing_until.is_some_and(|until| time <= until)
    }
}

/// Per-seat arbitration state: one trackpoint burst tracker, one typing tracker, and
/// the set of devices currently tagged as external mice.
#[derive(Debug, Clone)]
pub struct Arbitration {
    trackpoint: TrackpointActivity,
    typing: TypingActivity,
    external_mice: SmallVec<[DeviceId; 4]>,
}

impl Arbitration {
    /// A fresh arbitration tracker for a new seat.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trackpoint: TrackpointActivity::new(),
            typing: TypingActivity::new(),
            external_mice: SmallVec::new(),
        }
    }

    /// Feed a relative-motion (or button) event from a device tagged
    /// [`ArbitrationRole::Trackpoint`].
    pub fn feed_trackpoint_event(&mut self, time: Micros) {
        self.trackpoint.feed_event(time);
    }

    /// Feed a key-down from a device tagged [`ArbitrationRole::Keyboard`].
    pub fn feed_keyboard_key(&mut self, code: u16, time: Micros) {
        self.typing.feed_key_down(code, time);
    }

    /// Tag `device` as a currently-present external mouse (§4.9, §4.8.6).
    pub fn add_external_mouse(&mut self, device: DeviceId) {
        if !self.external_mice.contains(&device) {
            self.external_mice.push(device);
        }
    }

    /// Untag `device` as an external mouse, e.g. on removal.
    pub fn remove_external_mouse(&mut self, device: DeviceId) {
        self.external_mice.retain(|&id| id != device);
    }

    /// True if any external mouse is currently present.
    #[must_use]
    pub fn external_mouse_present(&self) -> bool {
        !self.external_mice.is_empty()
    }

    /// True if a trackpoint has been active recently enough to suppress touchpad
    /// motion/tap/edge-scroll at `time` (§4.9).
    #[must_use]
    pub fn is_trackpoint_active(&self, time: Micros) -> bool {
        self.trackpoint.is_active(time)
    }

    /// True if DWT should currently suppress new touches at `time` (§4.9, §4.8.3).
    #[must_use]
    pub fn is_typing(&self, time: Micros) -> bool {
        self.typing.is_typing(time)
    }
}

impl Default for Arbitration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_events_within_window_activates_trackpoint() {
        let mut arb = Arbitration::new();
        arb.feed_trackpoint_event(Micros(0));
        arb.feed_trackpoint_event(Micros(10_000));
        assert!(!arb.is_trackpoint_active(Micros(10_000)));
        arb.feed_trackpoint_event(Micros(20_000));
        assert!(arb.is_trackpoint_active(Micros(20_000)));
    }

    #[test]
    fn trackpoint_activity_expires_without_further_events() {
        let mut arb = Arbitration::new();
        arb.feed_trackpoint_event(Micros(0));
        arb.feed_trackpoint_event(Micros(10_000));
        arb.feed_trackpoint_event(Micros(20_000));
        assert!(arb.is_trackpoint_active(Micros::from_ms(300)));
        assert!(!arb.is_trackpoint_active(Micros::from_ms(321)));
    }

    #[test]
    fn further_events_extend_the_active_window() {
        let mut arb = Arbitration::new();
        arb.feed_trackpoint_event(Micros(0));
        arb.feed_trackpoint_event(Micros(10_000));
        arb.feed_trackpoint_event(Micros(20_000));
        arb.feed_trackpoint_event(Micros::from_ms(250));
        assert!(arb.is_trackpoint_active(Micros::from_ms(549)));
    }

    #[test]
    fn slow_events_never_complete_a_burst() {
        let mut arb = Arbitration::new();
        arb.feed_trackpoint_event(Micros(0));
        arb.feed_trackpoint_event(Micros::from_ms(100));
        arb.feed_trackpoint_event(Micros::from_ms(200));
        assert!(!arb.is_trackpoint_active(Micros::from_ms(200)));
    }

    #[test]
    fn first_key_arms_dwt_for_200ms() {
        let mut arb = Arbitration::new();
        arb.feed_keyboard_key(evdev::Key::KEY_A.0, Micros(0));
        assert!(arb.is_typing(Micros::from_ms(199)));
        assert!(!arb.is_typing(Micros::from_ms(201)));
    }

    #[test]
    fn sustained_typing_extends_to_500ms() {
        let mut arb = Arbitration::new();
        arb.feed_keyboard_key(evdev::Key::KEY_A.0, Micros(0));
        arb.feed_keyboard_key(evdev::Key::KEY_B.0, Micros::from_ms(100));
        assert!(arb.is_typing(Micros::from_ms(599)));
        assert!(!arb.is_typing(Micros::from_ms(601)));
    }

    #[test]
    fn modifier_only_press_never_arms_dwt() {
        let mut arb = Arbitration::new();
        arb.feed_keyboard_key(evdev::Key::KEY_LEFTSHIFT.0, Micros(0));
        assert!(!arb.is_typing(Micros(0)));
    }

    #[test]
    fn function_keys_never_arm_dwt() {
        let mut arb = Arbitration::new();
        arb.feed_keyboard_key(evdev::Key::KEY_F5.0, Micros(0));
        assert!(!arb.is_typing(Micros(0)));
    }

    #[test]
    fn external_mouse_tagging_is_idempotent() {
        let mut arb = Arbitration::new();
        let mouse = DeviceId(5);
        arb.add_external_mouse(mouse);
        arb.add_external_mouse(mouse);
        assert!(arb.external_mouse_present());
        arb.remove_external_mouse(mouse);
        assert!(!arb.external_mouse_present());
    }
}
