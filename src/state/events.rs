//! Change notification bus: per-room, per-category publish/subscribe.
//!
//! Producers announce "room changed", "results changed", or "room expired"
//! without knowing who is listening; the realtime session layer subscribes
//! and recomputes snapshots on demand. The bus holds broadcast senders only,
//! never connection objects, so the transport stays decoupled from domain
//! events.

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Snapshot categories a client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Room metadata and participant list.
    Room,
    /// Tallies, completion state, and winners.
    Results,
}

/// Signal carried on a room's channels. Signals are wake-ups, not payloads:
/// subscribers recompute the full snapshot from the store, so a lagged
/// receiver loses nothing but an intermediate wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomSignal {
    /// The subscribed category's underlying data changed.
    Changed,
    /// The room's wall-clock deadline passed; streams should terminate.
    Expired,
}

struct RoomTopics {
    room: broadcast::Sender<RoomSignal>,
    results: broadcast::Sender<RoomSignal>,
}

impl RoomTopics {
    fn new(capacity: usize) -> Self {
        let (room, _) = broadcast::channel(capacity);
        let (results, _) = broadcast::channel(capacity);
        Self { room, results }
    }

    fn sender(&self, category: EventCategory) -> &broadcast::Sender<RoomSignal> {
        match category {
            EventCategory::Room => &self.room,
            EventCategory::Results => &self.results,
        }
    }

    fn is_idle(&self) -> bool {
        self.room.receiver_count() == 0 && self.results.receiver_count() == 0
    }
}

/// Registry of per-room broadcast channels. Constructed once as part of the
/// application state and passed by handle; there is no global instance.
pub struct RoomEventBus {
    capacity: usize,
    topics: DashMap<Uuid, RoomTopics>,
}

impl RoomEventBus {
    /// Create an empty bus whose channels buffer `capacity` signals.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            topics: DashMap::new(),
        }
    }

    /// Register a listener for `(room_id, category)`, creating the room's
    /// channels on first use.
    pub fn subscribe(
        &self,
        room_id: Uuid,
        category: EventCategory,
    ) -> broadcast::Receiver<RoomSignal> {
        self.topics
            .entry(room_id)
            .or_insert_with(|| RoomTopics::new(self.capacity))
            .sender(category)
            .subscribe()
    }

    /// Announce that the room's metadata or participant list changed.
    pub fn publish_room_changed(&self, room_id: Uuid) {
        self.publish(room_id, EventCategory::Room, RoomSignal::Changed);
    }

    /// Announce that the room's votes or completion state changed.
    pub fn publish_results_changed(&self, room_id: Uuid) {
        self.publish(room_id, EventCategory::Results, RoomSignal::Changed);
    }

    /// Announce that the room passed its deadline. Delivered on both
    /// categories so every stream of the room terminates.
    pub fn publish_expired(&self, room_id: Uuid) {
        self.publish(room_id, EventCategory::Room, RoomSignal::Expired);
        self.publish(room_id, EventCategory::Results, RoomSignal::Expired);
    }

    /// Drop the room's channels when no listener remains. Returns true when
    /// the entry was removed. Removing the entry (rather than keeping an
    /// inactive one) keeps the registry bounded by the set of rooms with live
    /// subscribers.
    pub fn release_if_idle(&self, room_id: Uuid) -> bool {
        self.topics
            .remove_if(&room_id, |_, topics| topics.is_idle())
            .is_some()
    }

    /// Number of rooms with registered channels.
    pub fn tracked_rooms(&self) -> usize {
        self.topics.len()
    }

    fn publish(&self, room_id: Uuid, category: EventCategory, signal: RoomSignal) {
        // No entry means no subscribers; publishing is then a no-op.
        if let Some(topics) = self.topics.get(&room_id) {
            let _ = topics.sender(category).send(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let bus = RoomEventBus::new(4);
        bus.publish_room_changed(Uuid::new_v4());
        bus.publish_expired(Uuid::new_v4());
        assert_eq!(bus.tracked_rooms(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_their_category_only() {
        let bus = RoomEventBus::new(4);
        let room_id = Uuid::new_v4();
        let mut room_rx = bus.subscribe(room_id, EventCategory::Room);
        let mut results_rx = bus.subscribe(room_id, EventCategory::Results);

        bus.publish_results_changed(room_id);
        assert_eq!(results_rx.recv().await.unwrap(), RoomSignal::Changed);
        assert!(room_rx.try_recv().is_err());

        bus.publish_expired(room_id);
        assert_eq!(room_rx.recv().await.unwrap(), RoomSignal::Expired);
        assert_eq!(results_rx.recv().await.unwrap(), RoomSignal::Expired);
    }

    #[test]
    fn other_rooms_do_not_cross_talk() {
        let bus = RoomEventBus::new(4);
        let watched = Uuid::new_v4();
        let mut rx = bus.subscribe(watched, EventCategory::Room);

        bus.publish_room_changed(Uuid::new_v4());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn releasing_last_listener_removes_the_room_entry() {
        let bus = RoomEventBus::new(4);
        let room_id = Uuid::new_v4();
        let rx = bus.subscribe(room_id, EventCategory::Room);
        assert_eq!(bus.tracked_rooms(), 1);

        // Still held: release must refuse.
        assert!(!bus.release_if_idle(room_id));

        drop(rx);
        assert!(bus.release_if_idle(room_id));
        assert_eq!(bus.tracked_rooms(), 0);
    }
}
