//! Seat slot table (§3) and device arena (§9 "arena of device handles with stable
//! indices").
//!
//! The slot map is the only cross-device mutable state in the system (§9): it lives
//! here on the `Seat`, not on individual devices, and every mutation site is
//! documented.

const MAX_SEAT_SLOTS: usize = 64;

/// A stable, small identifier for a device within a seat's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

/// A library-wide contact identifier, unique within a seat, allocated on touch begin
/// and released on the matching touch end (§3 "Seat slot table").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeatSlot(pub u8);

/// The per-seat bitset of currently assigned touch identifiers.
#[derive(Debug, Clone, Default)]
pub struct SeatSlotMap {
    bits: u64,
}

impl SeatSlotMap {
    /// An empty slot map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the lowest unset bit (§3 "Allocation picks the lowest unset bit").
    /// Returns `None` if all `MAX_SEAT_SLOTS` slots are in use.
    pub fn allocate(&mut self) -> Option<SeatSlot> {
        if self.bits == u64::MAX {
            return None;
        }
        let index = self.bits.trailing_ones() as usize;
        if index >= MAX_SEAT_SLOTS {
            return None;
        }
        self.bits |= 1 << index;
        Some(SeatSlot(index as u8))
    }

    /// Release a previously allocated slot. Releasing a slot that isn't set is a no-op
    /// (idempotent, matching the "always clears the bit" invariant under double-end).
    pub fn release(&mut self, slot: SeatSlot) {
        self.bits &= !(1u64 << slot.0);
    }

    /// True if `slot` is currently assigned.
    #[must_use]
    pub fn is_set(&self, slot: SeatSlot) -> bool {
        self.bits & (1u64 << slot.0) != 0
    }

    /// Number of slots currently assigned, i.e. `popcount(slot_map)` from §8's
    /// testable property.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.bits.count_ones()
    }
}

/// A seat: the grouping of input devices that share pointer/keyboard focus and the
/// owner of the shared slot map.
#[derive(Debug, Clone, Default)]
pub struct Seat {
    /// Human-readable seat name (e.g. `"seat0"`), mirrored from the host.
    pub name: String,
    slot_map: SeatSlotMap,
    next_device_id: u32,
}

impl Seat {
    /// Create a named, empty seat.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot_map: SeatSlotMap::new(),
            next_device_id: 0,
        }
    }

    /// Allocate the next stable `DeviceId` for a newly added device.
    pub fn next_device_id(&mut self) -> DeviceId {
        let id = DeviceId(self.next_device_id);
        self.next_device_id += 1;
        id
    }

    /// Shared access to the seat slot map (touch begin/end are the only mutation
    /// sites, both inside `dispatch::*`).
    pub fn slot_map(&mut self) -> &mut SeatSlotMap {
        &mut self.slot_map
    }

    /// Read-only access to the seat slot map.
    #[must_use]
    pub fn slot_map_ref(&self) -> &SeatSlotMap {
        &self.slot_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_lowest_unset_bit() {
        let mut map = SeatSlotMap::new();
        let a = map.allocate().unwrap();
        let b = map.allocate().unwrap();
        assert_eq!(a, SeatSlot(0));
        assert_eq!(b, SeatSlot(1));
        map.release(a);
        let c = map.allocate().unwrap();
        assert_eq!(c, SeatSlot(0));
    }

    #[test]
    fn release_is_idempotent() {
        let mut map = SeatSlotMap::new();
        let slot = SeatSlot(3);
        map.release(slot);
        assert!(!map.is_set(slot));
    }

    #[test]
    fn count_matches_popcount() {
        let mut map = SeatSlotMap::new();
        map.allocate();
        map.allocate();
        map.allocate();
        assert_eq!(map.count(), 3);
    }

    #[test]
    fn device_ids_are_stable_and_increasing() {
        let mut seat = Seat::new("seat0");
        let a = seat.next_device_id();
        let b = seat.next_device_id();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }
}
