//! Lid switch / paired-keyboard correction (§4.7).
//!
//! Grounded on `original_source/src/evdev-lid.c`'s `lid_switch_*` state and its
//! keyboard-listener pairing, which treats a keyboard key event while the lid is
//! reportedly closed as proof the switch is stuck.

use smallvec::SmallVec;

use crate::quirks::LidSwitchReliability;
use crate::seat::DeviceId;

/// Lids pair with at most this many keyboards in practice (§9 "up to 3 paired
/// internal keyboards").
pub const MAX_PAIRED_KEYBOARDS: usize = 3;

/// Current reported state of a lid switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LidState {
    /// Lid is open.
    Open,
    /// Lid is reported closed.
    Closed,
}

/// What the caller should do after feeding an event into [`LidSwitch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LidAction {
    /// No externally visible change.
    None,
    /// Emit a `switch_toggle` for the lid with the given new state.
    Emit(LidState),
    /// The lid was forced back open due to a keyboard event while closed. Emit the
    /// toggle, and if `write_back` is set, the host should also write a synthetic
    /// `SW_LID=0` back to the kernel device (§4.7).
    ForceOpen {
        /// Whether the reliability quirk calls for writing the correction back.
        write_back: bool,
    },
}

/// A lid switch device, tracking its state and the keyboards it's paired with for
/// the stuck-switch correction.
#[derive(Debug, Clone)]
pub struct LidSwitch {
    state: LidState,
    reliability: LidSwitchReliability,
    paired_keyboards: SmallVec<[DeviceId; MAX_PAIRED_KEYBOARDS]>,
    synced: bool,
}

impl LidSwitch {
    /// A lid switch in the open state, with the given reliability quirk.
    #[must_use]
    pub fn new(reliability: LidSwitchReliability) -> Self {
        Self {
            state: LidState::Open,
            reliability,
            paired_keyboards: SmallVec::new(),
            synced: false,
        }
    }

    /// Pair a keyboard device with this lid, up to [`MAX_PAIRED_KEYBOARDS`].
    pub fn pair_keyboard(&mut self, keyboard: DeviceId) -> bool {
        if self.paired_keyboards.len() >= MAX_PAIRED_KEYBOARDS {
            return false;
        }
        if !self.paired_keyboards.contains(&keyboard) {
            self.paired_keyboards.push(keyboard);
        }
        true
    }

    /// Current reported state.
    #[must_use]
    pub fn state(&self) -> LidState {
        self.state
    }

    /// True if `keyboard` is paired with this lid.
    #[must_use]
    pub fn is_paired(&self, keyboard: DeviceId) -> bool {
        self.paired_keyboards.contains(&keyboard)
    }

    /// Feed a raw `SW_LID` event. The first sync of an unreliable lid that reports
    /// closed is suppressed (§4.5 "unreliable lids ignore the initial closed state
    /// and wait for the first close event post-init").
    pub fn switch_event(&mut self, closed: bool) -> LidAction {
        let is_initial_sync = !self.synced;
        self.synced = true;

        if is_initial_sync
            && closed
            && self.reliability != LidSwitchReliability::Reliable
        {
            self.state = LidState::Open;
            return LidAction::None;
        }

        let new_state = if closed { LidState::Closed } else { LidState::Open };
        if new_state == self.state {
            return LidAction::None;
        }
        self.state = new_state;
        LidAction::Emit(new_state)
    }

    /// Feed a keyboard key event from a paired keyboard. If the lid currently reads
    /// closed, this is proof the switch is stuck and the lid is forced open (§4.7).
    pub fn keyboard_key_event(&mut self, keyboard: DeviceId) -> LidAction {
        if !self.is_paired(keyboard) || self.state != LidState::Closed {
            return LidAction::None;
        }
        self.state = LidState::Open;
        let write_back = matches!(self.reliability, LidSwitchReliability::WriteOpen);
        LidAction::ForceOpen { write_back }
    }
}
