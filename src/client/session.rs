//! Stored participant identity and its reconciliation against a room.
//!
//! A client keeps the participant id it was handed at join time and presents
//! it on later visits. The stored identity is only trusted after it has been
//! confirmed against the room's current participant list; anything stale,
//! renamed, or removed gets discarded so the client falls back to joining
//! again.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::dto::participant::ParticipantDto;

/// How long a stored identity stays valid without confirmation.
pub const IDENTITY_TTL: Duration = Duration::hours(24);

/// One remembered join, scoped to a single room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredIdentity {
    /// Participant id handed out at join time.
    pub participant_id: Uuid,
    /// Display name used when joining.
    pub name: String,
    /// When the identity was stored.
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

impl StoredIdentity {
    fn is_stale(&self, now: OffsetDateTime) -> bool {
        now - self.saved_at > IDENTITY_TTL
    }
}

/// Result of checking a stored identity against the room's roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The identity matches a current participant; safe to act under it.
    Confirmed(Uuid),
    /// The identity was stale or no longer matches; it has been removed.
    Discarded,
    /// Nothing was stored for this room.
    NoIdentity,
}

/// Per-room identity storage, the local-storage analogue of a browser client.
#[derive(Debug, Default)]
pub struct IdentityStore {
    identities: HashMap<Uuid, StoredIdentity>,
}

impl IdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the identity handed out by a successful join.
    pub fn save(&mut self, room_id: Uuid, participant_id: Uuid, name: &str, now: OffsetDateTime) {
        self.identities.insert(
            room_id,
            StoredIdentity {
                participant_id,
                name: name.to_string(),
                saved_at: now,
            },
        );
    }

    /// Fetch the identity stored for a room, dropping it when past its TTL.
    pub fn restore(&mut self, room_id: Uuid, now: OffsetDateTime) -> Option<&StoredIdentity> {
        if self
            .identities
            .get(&room_id)
            .is_some_and(|identity| identity.is_stale(now))
        {
            self.identities.remove(&room_id);
        }
        self.identities.get(&room_id)
    }

    /// Forget the identity stored for a room.
    pub fn discard(&mut self, room_id: Uuid) -> bool {
        self.identities.remove(&room_id).is_some()
    }

    /// Confirm the stored identity against the room's current participants.
    ///
    /// Both the id and the name must still match; a participant that was
    /// removed and re-added under the same name gets a new id and therefore
    /// fails the check.
    pub fn reconcile(
        &mut self,
        room_id: Uuid,
        participants: &[ParticipantDto],
        now: OffsetDateTime,
    ) -> ReconcileOutcome {
        let Some(identity) = self.restore(room_id, now) else {
            return ReconcileOutcome::NoIdentity;
        };

        let stored_id = identity.participant_id;
        let confirmed = participants
            .iter()
            .any(|p| p.id == stored_id && p.name == identity.name);

        if confirmed {
            ReconcileOutcome::Confirmed(stored_id)
        } else {
            self.identities.remove(&room_id);
            ReconcileOutcome::Discarded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: Uuid, name: &str) -> ParticipantDto {
        ParticipantDto {
            id,
            name: name.into(),
            joined_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn confirmed_when_id_and_name_still_match() {
        let mut store = IdentityStore::new();
        let room = Uuid::new_v4();
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        store.save(room, id, "Alice", now);

        let roster = vec![participant(id, "Alice"), participant(Uuid::new_v4(), "Bob")];
        assert_eq!(
            store.reconcile(room, &roster, now),
            ReconcileOutcome::Confirmed(id)
        );
    }

    #[test]
    fn discarded_when_participant_was_replaced() {
        let mut store = IdentityStore::new();
        let room = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        store.save(room, Uuid::new_v4(), "Alice", now);

        // Same name, different id: the stored identity must not be trusted.
        let roster = vec![participant(Uuid::new_v4(), "Alice")];
        assert_eq!(
            store.reconcile(room, &roster, now),
            ReconcileOutcome::Discarded
        );
        assert_eq!(
            store.reconcile(room, &roster, now),
            ReconcileOutcome::NoIdentity
        );
    }

    #[test]
    fn stale_identities_expire() {
        let mut store = IdentityStore::new();
        let room = Uuid::new_v4();
        let id = Uuid::new_v4();
        let saved = OffsetDateTime::now_utc();
        store.save(room, id, "Alice", saved);

        let later = saved + IDENTITY_TTL + Duration::minutes(1);
        assert!(store.restore(room, later).is_none());
        assert_eq!(
            store.reconcile(room, &[participant(id, "Alice")], later),
            ReconcileOutcome::NoIdentity
        );
    }

    #[test]
    fn identities_are_scoped_per_room() {
        let mut store = IdentityStore::new();
        let now = OffsetDateTime::now_utc();
        let (room_a, room_b) = (Uuid::new_v4(), Uuid::new_v4());
        store.save(room_a, Uuid::new_v4(), "Alice", now);

        assert!(store.restore(room_b, now).is_none());
        assert!(store.discard(room_a));
        assert!(!store.discard(room_a));
    }
}
