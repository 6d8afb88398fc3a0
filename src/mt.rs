//! Multi-touch slot model (§4.4): `ABS_MT_SLOT` indexed contact tracking, fake-finger
//! counting for drivers without true slots, and touch resurrection.
//!
//! Grounded on `original_source/src/evdev-mt-touchpad.c` (slot array, tracking-id
//! handling) and `original_source/src/evdev-fallback.c` (fake-finger bit decoding).

use smallvec::SmallVec;

use crate::geom::DeviceCoords;
use crate::seat::SeatSlot;

/// Maximum number of kernel MT slots tracked inline before spilling to the heap; covers
/// every touchpad seen in practice without an allocation.
pub const INLINE_SLOTS: usize = 5;

/// Lifecycle of a single MT (or single-touch) contact, independent of the touchpad
/// state machine in `dispatch::touchpad` which layers palm/thumb/pressure gating on
/// top of this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchLifecycle {
    /// No tracking id assigned; slot is unused.
    None,
    /// Tracking id assigned but not yet reported as touching (`BTN_TOUCH`/threshold).
    Hovering,
    /// Just started touching this frame.
    Begin,
    /// Continuing to touch, position may have updated.
    Update,
    /// Tracking id released or fake-finger dropped; pending a resurrection check
    /// before becoming `End` (§4.4 "Touch resurrection").
    MaybeEnd,
    /// Touch has ended; seat slot released.
    End,
}

/// One MT slot's bookkeeping (§3's "slot record", restricted to the raw-protocol
/// fields this module owns — palm/thumb/pressure state lives in `dispatch::touchpad`).
#[derive(Debug, Clone, Copy)]
pub struct SlotRecord {
    /// Seat-wide identifier for this contact, assigned on begin.
    pub seat_slot: Option<SeatSlot>,
    /// Current position.
    pub point: DeviceCoords,
    /// Kernel tracking id; `None` means the slot has no active contact.
    pub tracking_id: Option<i32>,
    /// Lifecycle state.
    pub state: TouchLifecycle,
    /// Set whenever `ABS_MT_POSITION_X/Y` touches this slot, cleared after the frame
    /// using it is processed.
    pub dirty: bool,
}

impl Default for SlotRecord {
    fn default() -> Self {
        Self {
            seat_slot: None,
            point: DeviceCoords::default(),
            tracking_id: None,
            state: TouchLifecycle::None,
            dirty: false,
        }
    }
}

/// The fake-finger contact count, decoded from `BTN_TOOL_FINGER/DOUBLETAP/…` (§4.4
/// "Fake-finger counting").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerCount {
    /// No `BTN_TOOL_*` bit currently set.
    None,
    /// Exactly `n` fingers reported, `1..=5`.
    Count(u8),
    /// `BTN_TOOL_QUINTTAP` was set and released: 6 or more fingers, exact count
    /// unknown.
    Overflow,
}

/// Decodes the live `BTN_TOOL_FINGER..QUINTTAP` bitmap into a [`FingerCount`].
///
/// `bits` has bit 0 = `BTN_TOOL_FINGER`, bit 1 = `BTN_TOOL_DOUBLETAP`, ... bit 4 =
/// `BTN_TOOL_QUINTTAP`; `overflow_latched` records whether quinttap has already been
/// seen released once (§4.4: "set plus release transitions the count to overflow").
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeFingerState {
    bits: u8,
    overflow_latched: bool,
}

impl FakeFingerState {
    /// A fresh tracker with no bits set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `BTN_TOOL_*` bit transition. `index` is `0` for `BTN_TOOL_FINGER`
    /// through `4` for `BTN_TOOL_QUINTTAP`.
    pub fn set_bit(&mut self, index: u8, pressed: bool) {
        debug_assert!(index < 5);
        let mask = 1u8 << index;
        if pressed {
            self.bits |= mask;
        } else {
            if index == 4 && self.bits & mask != 0 {
                self.overflow_latched = true;
            }
            self.bits &= !mask;
        }
    }

    /// Current contact count. Only one bit should be set at a time (§4.4); if more
    /// than one is set this still returns a value via `ffs`, matching the original's
    /// leniency, and the caller is responsible for logging the violation.
    #[must_use]
    pub fn count(&self) -> FingerCount {
        if self.bits == 0 {
            if self.overflow_latched {
                return FingerCount::Overflow;
            }
            return FingerCount::None;
        }
        // ffs(bitmap >> 1) per §4.4; our bits are already zero-indexed from
        // BTN_TOOL_FINGER, so `trailing_zeros + 1` is the finger count directly.
        let n = self.bits.trailing_zeros() as u8 + 1;
        FingerCount::Count(n)
    }

    /// True if more than one `BTN_TOOL_*` bit is simultaneously set, a driver
    /// violation the caller should rate-limit log (§4.4 "violations are logged").
    #[must_use]
    pub fn has_conflicting_bits(&self) -> bool {
        self.bits.count_ones() > 1
    }

    /// Reset to empty, e.g. on device suspend.
    pub fn clear(&mut self) {
        self.bits = 0;
        self.overflow_latched = false;
    }
}

/// The full MT slot table for one device.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: SmallVec<[SlotRecord; INLINE_SLOTS]>,
    active: usize,
    fake_fingers: FakeFingerState,
}

impl SlotTable {
    /// Build a table with `slot_count` slots (from the device's `ABS_MT_SLOT` max),
    /// or a single implicit slot for single-touch devices.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        let slot_count = slot_count.max(1);
        Self {
            slots: smallvec::smallvec![SlotRecord::default(); slot_count],
            active: 0,
            fake_fingers: FakeFingerState::new(),
        }
    }

    /// Number of slots in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the table has no slots (never constructed this way via [`Self::new`],
    /// but kept for API symmetry).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Select the active slot index for subsequent `ABS_MT_*` updates. Out-of-range
    /// values are clamped to the last valid slot, matching §4.4's "clamped with a
    /// warning" — the warning itself is the caller's responsibility since it owns the
    /// rate limiter.
    pub fn select(&mut self, raw_index: i32) -> bool {
        let max = self.slots.len() - 1;
        let clamped = raw_index.clamp(0, max as i32) as usize;
        let in_range = raw_index >= 0 && (raw_index as usize) <= max;
        self.active = clamped;
        in_range
    }

    /// The currently selected slot.
    #[must_use]
    pub fn active(&self) -> &SlotRecord {
        &self.slots[self.active]
    }

    /// Mutable access to the currently selected slot.
    pub fn active_mut(&mut self) -> &mut SlotRecord {
        &mut self.slots[self.active]
    }

    /// Mutable access to the fake-finger bit tracker.
    pub fn fake_fingers_mut(&mut self) -> &mut FakeFingerState {
        &mut self.fake_fingers
    }

    /// Apply `ABS_MT_TRACKING_ID`: `id >= 0` starts a contact on the active slot, `-1`
    /// ends it (§4.4).
    pub fn tracking_id(&mut self, id: i32) {
        let slot = self.active_mut();
        if id >= 0 {
            slot.tracking_id = Some(id);
            slot.state = TouchLifecycle::Hovering;
        } else {
            slot.tracking_id = None;
            slot.state = TouchLifecycle::MaybeEnd;
        }
    }

    /// Apply a position update to the active slot, marking it dirty.
    pub fn position(&mut self, point: DeviceCoords) {
        let slot = self.active_mut();
        slot.point = point;
        slot.dirty = true;
    }

    /// All slots, for iterating dirty ones at frame boundaries.
    pub fn iter(&self) -> impl Iterator<Item = &SlotRecord> {
        self.slots.iter()
    }

    /// All slots mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SlotRecord> {
        self.slots.iter_mut()
    }

    /// Touch resurrection (§4.4): if `slot_index` is `MaybeEnd` but the fake-finger
    /// count still implies this many contacts are present, restore it to `Update`
    /// rather than letting it fall through to `End`. Call before frame processing.
    pub fn resurrect(&mut self, slot_index: usize, still_present: bool) {
        if let Some(slot) = self.slots.get_mut(slot_index) {
            if slot.state == TouchLifecycle::MaybeEnd && still_present {
                slot.state = TouchLifecycle::Update;
            }
        }
    }

    /// Clear all dirty flags, called after a frame's dirty slots have been consumed.
    pub fn clear_dirty(&mut self) {
        for slot in &mut self.slots {
            slot.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_clamps_out_of_range_index() {
        let mut table = SlotTable::new(3);
        assert!(!table.select(10));
        assert_eq!(table.active, 2);
        assert!(table.select(1));
        assert_eq!(table.active, 1);
    }

    #[test]
    fn tracking_id_sets_hovering_then_maybe_end() {
        let mut table = SlotTable::new(2);
        table.select(0);
        table.tracking_id(5);
        assert_eq!(table.active().state, TouchLifecycle::Hovering);
        table.tracking_id(-1);
        assert_eq!(table.active().state, TouchLifecycle::MaybeEnd);
        assert!(table.active().tracking_id.is_none());
    }

    #[test]
    fn fake_finger_count_decodes_single_bit() {
        let mut fingers = FakeFingerState::new();
        fingers.set_bit(2, true); // BTN_TOOL_TRIPLETAP
        assert_eq!(fingers.count(), FingerCount::Count(3));
    }

    #[test]
    fn fake_finger_quinttap_release_latches_overflow() {
        let mut fingers = FakeFingerState::new();
        fingers.set_bit(4, true);
        fingers.set_bit(4, false);
        assert_eq!(fingers.count(), FingerCount::Overflow);
    }

    #[test]
    fn fake_finger_conflicting_bits_detected() {
        let mut fingers = FakeFingerState::new();
        fingers.set_bit(0, true);
        fingers.set_bit(1, true);
        assert!(fingers.has_conflicting_bits());
    }

    #[test]
    fn resurrection_restores_maybe_end_to_update() {
        let mut table = SlotTable::new(1);
        table.select(0);
        table.tracking_id(1);
        table.tracking_id(-1);
        assert_eq!(table.active().state, TouchLifecycle::MaybeEnd);
        table.resurrect(0, true);
        assert_eq!(table.slots[0].state, TouchLifecycle::Update);
    }

    #[test]
    fn resurrection_leaves_non_maybe_end_untouched() {
        let mut table = SlotTable::new(1);
        table.resurrect(0, true);
        assert_eq!(table.slots[0].state, TouchLifecycle::None);
    }
}
