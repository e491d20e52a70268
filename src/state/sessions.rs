//! Bookkeeping for live realtime connections.

use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use uuid::Uuid;

use crate::state::events::EventCategory;

/// Metadata recorded for one live connection.
pub struct SessionInfo {
    /// Room the connection is watching.
    pub room_id: Uuid,
    /// Snapshot category the connection receives.
    pub category: EventCategory,
    /// When the connection was registered.
    pub connected_at: Instant,
    last_activity: Mutex<Instant>,
}

impl SessionInfo {
    fn last_activity(&self) -> Instant {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of live connections keyed by connection id.
///
/// The inactivity sweep is a safety net against connections whose close was
/// never observed; forwarders check [`SessionRegistry::is_alive`] before
/// pushing and exit once their entry is gone.
#[derive(Default)]
pub struct SessionRegistry {
    connections: DashMap<Uuid, SessionInfo>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection.
    pub fn register(&self, connection_id: Uuid, room_id: Uuid, category: EventCategory) {
        let now = Instant::now();
        self.connections.insert(
            connection_id,
            SessionInfo {
                room_id,
                category,
                connected_at: now,
                last_activity: Mutex::new(now),
            },
        );
    }

    /// Remove a connection; returns false when it was already gone.
    pub fn deregister(&self, connection_id: Uuid) -> bool {
        self.connections.remove(&connection_id).is_some()
    }

    /// Refresh a connection's activity timestamp after a successful push.
    pub fn touch(&self, connection_id: Uuid) {
        if let Some(info) = self.connections.get(&connection_id) {
            let mut guard = info
                .last_activity
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *guard = Instant::now();
        }
    }

    /// Whether the connection is still registered.
    pub fn is_alive(&self, connection_id: Uuid) -> bool {
        self.connections.contains_key(&connection_id)
    }

    /// Total number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of live connections watching one room.
    pub fn count_for_room(&self, room_id: Uuid) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.room_id == room_id)
            .count()
    }

    /// Remove every connection idle longer than `timeout`; returns the ids
    /// that were dropped.
    pub fn sweep_idle(&self, timeout: Duration) -> Vec<Uuid> {
        let now = Instant::now();
        let stale: Vec<Uuid> = self
            .connections
            .iter()
            .filter(|entry| now.duration_since(entry.last_activity()) > timeout)
            .map(|entry| *entry.key())
            .collect();

        stale
            .into_iter()
            .filter(|id| self.connections.remove(id).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_deregister_round_trip() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        let room = Uuid::new_v4();

        registry.register(id, room, EventCategory::Room);
        assert!(registry.is_alive(id));
        assert_eq!(registry.count_for_room(room), 1);

        assert!(registry.deregister(id));
        assert!(!registry.is_alive(id));
        assert!(!registry.deregister(id));
    }

    #[test]
    fn sweep_removes_only_idle_connections() {
        let registry = SessionRegistry::new();
        let fresh = Uuid::new_v4();
        let stale = Uuid::new_v4();
        let room = Uuid::new_v4();
        registry.register(stale, room, EventCategory::Results);
        registry.register(fresh, room, EventCategory::Room);

        registry.touch(fresh);
        let removed = registry.sweep_idle(Duration::from_secs(3600));
        assert!(removed.is_empty());

        std::thread::sleep(Duration::from_millis(5));
        let removed = registry.sweep_idle(Duration::from_millis(1));
        assert_eq!(removed.len(), 2);
        assert!(registry.is_empty());
    }
}
