//! Abstraction over the persistence layer for rooms, participants, and votes.

/// In-memory backend used by tests and storage-less deployments.
pub mod memory;
#[cfg(feature = "postgres-store")]
/// PostgreSQL backend.
pub mod postgres;

use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dao::{
        models::{ParticipantEntity, RoomEntity, TallyRowEntity, VoteEntity},
        storage::StorageResult,
    },
    state::lifecycle::RoomStatus,
};

/// Persistence gateway for the three-table store. Every statement is atomic
/// on its own; the unique indexes on `(room_id, name)` and
/// `(room_id, voter_id)` are the authoritative conflict arbiters.
pub trait RoomStore: Send + Sync {
    /// Insert a freshly created room.
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a room by id.
    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Update a room's stored status. Returns false when the room is gone.
    fn update_room_status(
        &self,
        id: Uuid,
        status: RoomStatus,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete a room, cascading to its participants and votes.
    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete every room whose deadline is behind `now`, cascading. Returns
    /// the number of rooms removed.
    fn purge_expired_rooms(&self, now: OffsetDateTime) -> BoxFuture<'static, StorageResult<u64>>;

    /// Insert a participant; surfaces [`ConflictKind::DuplicateName`] when the
    /// name is already taken in the room.
    ///
    /// [`ConflictKind::DuplicateName`]: crate::dao::storage::ConflictKind::DuplicateName
    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch one participant of a room.
    fn find_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// List a room's participants ordered by join time.
    fn list_participants(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Count a room's participants.
    fn count_participants(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    /// Insert a vote; surfaces [`ConflictKind::DuplicateVote`] when the voter
    /// has already voted in the room.
    ///
    /// [`ConflictKind::DuplicateVote`]: crate::dao::storage::ConflictKind::DuplicateVote
    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete every vote of a room (restart/cancel). Returns the count removed.
    fn delete_votes(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;
    /// Per-candidate vote counts for a room, one row per participant.
    fn tally_votes(&self, room_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<TallyRowEntity>>>;
    /// Distinct voter ids that have cast a vote in the room.
    fn voted_voter_ids(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;

    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
