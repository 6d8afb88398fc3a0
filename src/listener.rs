//! Cross-device listener registry (§9 "a per-device 'listener registry' keyed by
//! (source-device-id, event-kind)").
//!
//! This is how the lid/paired-keyboard correction (§4.7) and trackpoint/keyboard
//! arbitration (§4.9) observe events on a device other than their own without forming
//! a reference cycle: they register a `(DeviceId, EventKind)` subscription here and
//! get a `ListenerId` back to unregister with later.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::seat::DeviceId;

/// The coarse event classes other devices can subscribe to, a deliberately small set
/// — not the full [`crate::event::Event`] enum — naming only the cross-device signals
/// §4.7/§4.9 actually need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Any keyboard key press or release.
    KeyboardKey,
    /// A lid switch toggle.
    LidToggle,
    /// A tablet-mode switch toggle.
    TabletModeToggle,
    /// Any relative pointer motion (used by trackpoint/external-mouse arbitration).
    PointerMotion,
}

/// Opaque handle to a registered subscription, returned by [`ListenerRegistry::subscribe`]
/// and required to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of `(source device, event kind) -> subscriber ids` used for cross-device
/// correlation.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    subscribers: AHashMap<(DeviceId, EventKind), SmallVec<[ListenerId; 3]>>,
    subscriber_of: AHashMap<ListenerId, (DeviceId, EventKind)>,
    next_id: u64,
}

impl ListenerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `kind` events originating from `source`.
    pub fn subscribe(&mut self, source: DeviceId, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry((source, kind))
            .or_default()
            .push(id);
        self.subscriber_of.insert(id, (source, kind));
        id
    }

    /// Remove a subscription by its id. A no-op if already removed, e.g. because the
    /// source device was torn down and [`Self::remove_device`] already cleared it.
    pub fn unsubscribe(&mut self, id: ListenerId) {
        if let Some(key) = self.subscriber_of.remove(&id) {
            if let Some(ids) = self.subscribers.get_mut(&key) {
                ids.retain(|&existing| existing != id);
                if ids.is_empty() {
                    self.subscribers.remove(&key);
                }
            }
        }
    }

    /// How many subscribers are currently registered for `(source, kind)`.
    #[must_use]
    pub fn subscriber_count(&self, source: DeviceId, kind: EventKind) -> usize {
        self.subscribers
            .get(&(source, kind))
            .map_or(0, SmallVec::len)
    }

    /// Clear every subscription with `source` as its origin, called when a device is
    /// removed so stale listeners never fire (§3 "destroyed on removal").
    pub fn remove_device(&mut self, source: DeviceId) {
        let stale: Vec<_> = self
            .subscriber_of
            .iter()
            .filter(|(_, (dev, _))| *dev == source)
            .map(|(&id, _)| id)
            .collect();
        for id in stale {
            self.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_increments_count() {
        let mut registry = ListenerRegistry::new();
        registry.subscribe(DeviceId(0), EventKind::KeyboardKey);
        registry.subscribe(DeviceId(0), EventKind::KeyboardKey);
        assert_eq!(
            registry.subscriber_count(DeviceId(0), EventKind::KeyboardKey),
            2
        );
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let mut registry = ListenerRegistry::new();
        let a = registry.subscribe(DeviceId(0), EventKind::KeyboardKey);
        registry.subscribe(DeviceId(0), EventKind::KeyboardKey);
        registry.unsubscribe(a);
        assert_eq!(
            registry.subscriber_count(DeviceId(0), EventKind::KeyboardKey),
            1
        );
    }

    #[test]
    fn remove_device_clears_all_its_subscriptions() {
        let mut registry = ListenerRegistry::new();
        registry.subscribe(DeviceId(1), EventKind::LidToggle);
        registry.subscribe(DeviceId(1), EventKind::KeyboardKey);
        registry.remove_device(DeviceId(1));
        assert_eq!(registry.subscriber_count(DeviceId(1), EventKind::LidToggle), 0);
        assert_eq!(
            registry.subscriber_count(DeviceId(1), EventKind::KeyboardKey),
            0
        );
    }
}
