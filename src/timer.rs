//! Centralized timer wheel (§9 "a centralized priority-queue timer wheel keyed on
//! (DeviceId, slot)"), driven by the host calling [`TimerWheel::expire`] from its own
//! event loop (§5).
//!
//! Used by debounce (§4.6), DWT, trackpoint-activity and palm-edge timeouts. Lazy
//! deletion (a cancelled set checked on pop) keeps cancellation cheap without needing
//! to rebuild the heap.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ahash::AHashSet;

use crate::seat::DeviceId;
use crate::time::Micros;

/// Which per-device timer this entry is; `slot` disambiguates e.g. per-touch timers
/// from the single per-device debounce timer (`slot = None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    /// Owning device.
    pub device: DeviceId,
    /// MT slot this timer belongs to, or `None` for a device-wide timer.
    pub slot: Option<usize>,
    /// Disambiguates multiple concurrent timers on the same key (debounce vs DWT vs
    /// palm-edge all on the same device).
    pub purpose: TimerPurpose,
}

/// What a timer is for; callers match on this after [`TimerWheel::expire`] returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// Debounce hold-back release (§4.6).
    Debounce,
    /// Disable-while-typing window (§4.9).
    DisableWhileTyping,
    /// Trackpoint-activity suspension window (§4.9).
    TrackpointActivity,
    /// Palm-edge release timeout (§4.8.3).
    PalmEdge,
    /// Tap-to-click timeout.
    Tap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    expires_at: Micros,
    key: TimerKey,
    generation: u64,
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.expires_at
            .0
            .cmp(&other.expires_at.0)
            .then(self.generation.cmp(&other.generation))
    }
}

/// A min-heap of pending timers, keyed by `(DeviceId, slot, purpose)`.
#[derive(Debug, Default)]
pub struct TimerWheel {
    heap: BinaryHeap<Reverse<Entry>>,
    cancelled: AHashSet<(TimerKey, u64)>,
    next_generation: u64,
}

impl TimerWheel {
    /// An empty wheel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) a timer for `key`, firing at `expires_at`. Re-arming the same
    /// key implicitly cancels any previous pending timer for it.
    pub fn arm(&mut self, key: TimerKey, expires_at: Micros) {
        self.cancel(key);
        let generation = self.next_generation;
        self.next_generation += 1;
        self.heap.push(Reverse(Entry {
            expires_at,
            key,
            generation,
        }));
    }

    /// Cancel every pending timer for `key` (cancel-on-destroy, §9). Cheap: marks the
    /// heap entries stale rather than scanning and rebuilding the heap.
    pub fn cancel(&mut self, key: TimerKey) {
        for Reverse(entry) in &self.heap {
            if entry.key == key {
                self.cancelled.insert((entry.key, entry.generation));
            }
        }
    }

    /// Pop every timer whose `expires_at <= now`, returning their keys in expiry
    /// order. The host calls this before processing the next kernel event (§9 open
    /// question: timers always expire ahead of the next event they'd otherwise race).
    pub fn expire(&mut self, now: Micros) -> Vec<TimerKey> {
        let mut fired = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.expires_at.0 > now.0 {
                break;
            }
            let Reverse(entry) = self.heap.pop().expect("just peeked");
            if self.cancelled.remove(&(entry.key, entry.generation)) {
                continue;
            }
            fired.push(entry.key);
        }
        fired
    }

    /// True if the wheel has no pending timers (ignoring already-cancelled ones still
    /// sitting in the heap).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.len() <= self.cancelled.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(device: u32, purpose: TimerPurpose) -> TimerKey {
        TimerKey {
            device: DeviceId(device),
            slot: None,
            purpose,
        }
    }

    #[test]
    fn expire_fires_in_order_up_to_now() {
        let mut wheel = TimerWheel::new();
        wheel.arm(key(0, TimerPurpose::Debounce), Micros(100));
        wheel.arm(key(0, TimerPurpose::Tap), Micros(50));
        let fired = wheel.expire(Micros(200));
        assert_eq!(fired, vec![key(0, TimerPurpose::Tap), key(0, TimerPurpose::Debounce)]);
    }

    #[test]
    fn expire_leaves_future_timers_pending() {
        let mut wheel = TimerWheel::new();
        wheel.arm(key(0, TimerPurpose::Debounce), Micros(1_000));
        let fired = wheel.expire(Micros(10));
        assert!(fired.is_empty());
        assert!(!wheel.is_empty());
    }

    #[test]
    fn cancel_suppresses_a_pending_timer() {
        let mut wheel = TimerWheel::new();
        let k = key(0, TimerPurpose::PalmEdge);
        wheel.arm(k, Micros(10));
        wheel.cancel(k);
        let fired = wheel.expire(Micros(100));
        assert!(fired.is_empty());
    }

    #[test]
    fn rearming_does_not_fire_the_old_entry_twice() {
        let mut wheel = TimerWheel::new();
        let k = key(0, TimerPurpose::Debounce);
        wheel.arm(k, Micros(10));
        wheel.arm(k, Micros(20));
        let fired = wheel.expire(Micros(100));
        assert_eq!(fired, vec![k]);
    }
}
