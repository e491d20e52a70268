//! Entities mirroring the three persisted tables.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::state::lifecycle::RoomStatus;

/// Row of the `rooms` table.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomEntity {
    /// Opaque room identifier.
    pub id: Uuid,
    /// Free-text title, 1-100 characters.
    pub title: String,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
    /// Wall-clock deadline after which the room is dead regardless of status.
    pub expires_at: OffsetDateTime,
    /// Stored lifecycle status.
    pub status: RoomStatus,
}

impl RoomEntity {
    /// Whether the room is past its wall-clock deadline. The stored status is
    /// never trusted for this; callers re-check on every operation.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// Row of the `participants` table. A participant is both voter and candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantEntity {
    /// Opaque participant identifier, scoped to one room.
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Display name, unique within the room (case-sensitive).
    pub name: String,
    /// Join timestamp; participant lists are ordered by it.
    pub joined_at: OffsetDateTime,
}

/// Row of the `votes` table.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteEntity {
    /// Opaque vote identifier.
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Voting participant; at most one vote per `(room_id, voter_id)`.
    pub voter_id: Uuid,
    /// Chosen participant; may equal `voter_id` (self-votes are allowed).
    pub candidate_id: Uuid,
    /// Cast timestamp.
    pub created_at: OffsetDateTime,
}

/// Per-candidate vote count produced by the tally query. Rows come back in no
/// particular order; deterministic sorting happens in the tally service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyRowEntity {
    /// Candidate participant id.
    pub participant_id: Uuid,
    /// Candidate display name.
    pub name: String,
    /// Number of votes naming this candidate.
    pub vote_count: i64,
}
