//! In-memory [`RoomStore`] backend.
//!
//! Enforces the same uniqueness and cascade rules as the PostgreSQL backend
//! so the service layer can be exercised without a database.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dao::{
        models::{ParticipantEntity, RoomEntity, TallyRowEntity, VoteEntity},
        room_store::RoomStore,
        storage::{ConflictKind, StorageError, StorageResult},
    },
    state::lifecycle::RoomStatus,
};

#[derive(Default)]
struct Tables {
    rooms: HashMap<Uuid, RoomEntity>,
    participants: HashMap<Uuid, ParticipantEntity>,
    votes: HashMap<Uuid, VoteEntity>,
}

impl Tables {
    fn cascade_delete_room(&mut self, room_id: Uuid) {
        self.participants.retain(|_, p| p.room_id != room_id);
        self.votes.retain(|_, v| v.room_id != room_id);
    }
}

/// Hash-map backed store guarded by a single mutex. The lock is the
/// serialization point that stands in for the database's row-level atomicity.
#[derive(Default)]
pub struct MemoryRoomStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T + Send + 'static) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
    {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(f(&mut guard))
        })
    }
}

impl RoomStore for MemoryRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.with_tables(move |tables| {
            tables.rooms.insert(room.id, room);
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        self.with_tables(move |tables| tables.rooms.get(&id).cloned())
    }

    fn update_room_status(
        &self,
        id: Uuid,
        status: RoomStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.with_tables(move |tables| match tables.rooms.get_mut(&id) {
            Some(room) => {
                room.status = status;
                true
            }
            None => false,
        })
    }

    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.with_tables(move |tables| {
            if tables.rooms.remove(&id).is_some() {
                tables.cascade_delete_room(id);
                true
            } else {
                false
            }
        })
    }

    fn purge_expired_rooms(&self, now: OffsetDateTime) -> BoxFuture<'static, StorageResult<u64>> {
        self.with_tables(move |tables| {
            let expired: Vec<Uuid> = tables
                .rooms
                .values()
                .filter(|room| room.is_expired(now))
                .map(|room| room.id)
                .collect();
            for id in &expired {
                tables.rooms.remove(id);
                tables.cascade_delete_room(*id);
            }
            expired.len() as u64
        })
    }

    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.lock().unwrap_or_else(PoisonError::into_inner);
            let taken = guard
                .participants
                .values()
                .any(|p| p.room_id == participant.room_id && p.name == participant.name);
            if taken {
                return Err(StorageError::Conflict(ConflictKind::DuplicateName));
            }
            guard.participants.insert(participant.id, participant);
            Ok(())
        })
    }

    fn find_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.with_tables(move |tables| {
            tables
                .participants
                .get(&participant_id)
                .filter(|p| p.room_id == room_id)
                .cloned()
        })
    }

    fn list_participants(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        self.with_tables(move |tables| {
            let mut participants: Vec<ParticipantEntity> = tables
                .participants
                .values()
                .filter(|p| p.room_id == room_id)
                .cloned()
                .collect();
            participants.sort_by(|a, b| {
                a.joined_at
                    .cmp(&b.joined_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            participants
        })
    }

    fn count_participants(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.with_tables(move |tables| {
            tables
                .participants
                .values()
                .filter(|p| p.room_id == room_id)
                .count() as u64
        })
    }

    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.lock().unwrap_or_else(PoisonError::into_inner);
            let already_voted = guard
                .votes
                .values()
                .any(|v| v.room_id == vote.room_id && v.voter_id == vote.voter_id);
            if already_voted {
                return Err(StorageError::Conflict(ConflictKind::DuplicateVote));
            }
            guard.votes.insert(vote.id, vote);
            Ok(())
        })
    }

    fn delete_votes(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.with_tables(move |tables| {
            let before = tables.votes.len();
            tables.votes.retain(|_, v| v.room_id != room_id);
            (before - tables.votes.len()) as u64
        })
    }

    fn tally_votes(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TallyRowEntity>>> {
        self.with_tables(move |tables| {
            tables
                .participants
                .values()
                .filter(|p| p.room_id == room_id)
                .map(|p| TallyRowEntity {
                    participant_id: p.id,
                    name: p.name.clone(),
                    vote_count: tables
                        .votes
                        .values()
                        .filter(|v| v.room_id == room_id && v.candidate_id == p.id)
                        .count() as i64,
                })
                .collect()
        })
    }

    fn voted_voter_ids(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        self.with_tables(move |tables| {
            let mut ids: Vec<Uuid> = tables
                .votes
                .values()
                .filter(|v| v.room_id == room_id)
                .map(|v| v.voter_id)
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn room(id: Uuid, now: OffsetDateTime) -> RoomEntity {
        RoomEntity {
            id,
            title: "Lunch".into(),
            created_at: now,
            expires_at: now + Duration::minutes(30),
            status: RoomStatus::Waiting,
        }
    }

    fn participant(room_id: Uuid, name: &str, now: OffsetDateTime) -> ParticipantEntity {
        ParticipantEntity {
            id: Uuid::new_v4(),
            room_id,
            name: name.into(),
            joined_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_name_in_same_room_conflicts() {
        let store = MemoryRoomStore::new();
        let now = OffsetDateTime::now_utc();
        let room_id = Uuid::new_v4();
        store.insert_room(room(room_id, now)).await.unwrap();

        store
            .insert_participant(participant(room_id, "Alice", now))
            .await
            .unwrap();
        let err = store
            .insert_participant(participant(room_id, "Alice", now))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Conflict(ConflictKind::DuplicateName)
        ));

        // Same name in a different room is fine.
        let other = Uuid::new_v4();
        store.insert_room(room(other, now)).await.unwrap();
        store
            .insert_participant(participant(other, "Alice", now))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn second_vote_by_same_voter_conflicts() {
        let store = MemoryRoomStore::new();
        let now = OffsetDateTime::now_utc();
        let room_id = Uuid::new_v4();
        store.insert_room(room(room_id, now)).await.unwrap();
        let alice = participant(room_id, "Alice", now);
        let bob = participant(room_id, "Bob", now);
        store.insert_participant(alice.clone()).await.unwrap();
        store.insert_participant(bob.clone()).await.unwrap();

        let vote = VoteEntity {
            id: Uuid::new_v4(),
            room_id,
            voter_id: alice.id,
            candidate_id: bob.id,
            created_at: now,
        };
        store.insert_vote(vote.clone()).await.unwrap();

        let again = VoteEntity {
            id: Uuid::new_v4(),
            ..vote
        };
        let err = store.insert_vote(again).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Conflict(ConflictKind::DuplicateVote)
        ));
        assert_eq!(store.voted_voter_ids(room_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_room_cascades() {
        let store = MemoryRoomStore::new();
        let now = OffsetDateTime::now_utc();
        let room_id = Uuid::new_v4();
        store.insert_room(room(room_id, now)).await.unwrap();
        let alice = participant(room_id, "Alice", now);
        store.insert_participant(alice.clone()).await.unwrap();
        store
            .insert_vote(VoteEntity {
                id: Uuid::new_v4(),
                room_id,
                voter_id: alice.id,
                candidate_id: alice.id,
                created_at: now,
            })
            .await
            .unwrap();

        assert!(store.delete_room(room_id).await.unwrap());
        assert_eq!(store.count_participants(room_id).await.unwrap(), 0);
        assert!(store.voted_voter_ids(room_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn purge_removes_only_expired_rooms() {
        let store = MemoryRoomStore::new();
        let now = OffsetDateTime::now_utc();
        let dead = Uuid::new_v4();
        let alive = Uuid::new_v4();
        let mut expired = room(dead, now);
        expired.expires_at = now - Duration::minutes(1);
        store.insert_room(expired).await.unwrap();
        store.insert_room(room(alive, now)).await.unwrap();

        assert_eq!(store.purge_expired_rooms(now).await.unwrap(), 1);
        assert!(store.find_room(dead).await.unwrap().is_none());
        assert!(store.find_room(alive).await.unwrap().is_some());
    }
}
