//! Button debounce state machine (§4.6): filters mechanical chatter on a single
//! button per device, matching `original_source/src/evdev-fallback.c`'s
//! `fallback_filter_debounce_press`/`fallback_filter_debounce_release` pair.

use crate::time::Micros;

/// Bounce window: shorter than any real double-click, longer than a contact's bounce
/// chatter (§4.6).
pub const DEBOUNCE_MS: u64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No bounce has ever been observed on this device; debouncing not yet armed.
    Init,
    /// A bounce was seen once; the next release will be held back.
    Needed,
    /// Holding: waiting for the release that starts the hold-back timer.
    On,
    /// A release is held back, timer running.
    Active,
}

/// What the caller should do in response to a raw button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Emit the transition immediately.
    Emit,
    /// Drop the transition; hardware bounce.
    Drop,
    /// Hold the release back; it will be emitted later at `held_at` when the debounce
    /// timer fires.
    Hold {
        /// Original timestamp to emit the held release with, once the timer fires.
        held_at: Micros,
    },
    /// A pending held-back release should be flushed now (emitted at its original
    /// timestamp), immediately followed by processing this new press normally.
    FlushThenEmit {
        /// The previously debounced button whose release is being flushed.
        held_button: u16,
        /// Timestamp of the held release being flushed.
        held_at: Micros,
    },
}

/// Per-device, single-button debounce state (§4.6: "only one button debounced at a
/// time"). Bounce detection is keyed off the interval between a release and the
/// *next* press of the same button, not the press-to-release gap.
#[derive(Debug, Clone)]
pub struct Debouncer {
    state: State,
    tracked_button: Option<u16>,
    last_release_at: Option<Micros>,
    pending_release_at: Option<Micros>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self {
            state: State::Init,
            tracked_button: None,
            last_release_at: None,
            pending_release_at: None,
        }
    }
}

impl Debouncer {
    /// A fresh debouncer for a newly added device.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a press of `button` at `time`.
    pub fn press(&mut self, button: u16, time: Micros) -> Action {
        if let Some(tracked) = self.tracked_button {
            if tracked != button {
                // A different button pressed while we're holding back a release: flush
                // it and let this press through unfiltered (§4.6, only one button is
                // ever debounced at a time).
                if self.state == State::Active {
                    let held_at = self.pending_release_at.take().unwrap_or(time);
                    self.state = State::Init;
                    self.tracked_button = None;
                    self.last_release_at = None;
                    return Action::FlushThenEmit { held_button: tracked, held_at };
                }
                return Action::Emit;
            }
        }

        let bounced = self
            .last_release_at
            .is_some_and(|released| time.since(released) < DEBOUNCE_MS * 1_000);
        if !bounced {
            return Action::Emit;
        }

        match self.state {
            State::Init => {
                log::info!("enabling button debouncing for this device");
                self.state = State::Needed;
                Action::Drop
            }
            State::Active => Action::Drop,
            State::Needed | State::On => Action::Emit,
        }
    }

    /// Feed a release of `button` at `time`.
    pub fn release(&mut self, button: u16, time: Micros) -> Action {
        self.tracked_button = Some(button);
        self.last_release_at = Some(time);

        match self.state {
            State::Init => Action::Emit,
            State::Needed => {
                self.state = State::On;
                Action::Drop
            }
            State::On => {
                self.state = State::Active;
                self.pending_release_at = Some(time);
                Action::Hold { held_at: time }
            }
            State::Active => Action::Drop,
        }
    }

    /// The debounce timer for this device fired; emit the held-back release and
    /// return to `On` for the next cycle.
    pub fn timer_expired(&mut self) -> Option<Micros> {
        if self.state != State::Active {
            return None;
        }
        self.state = State::On;
        self.pending_release_at.take()
    }
}
