//! Room payloads.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::RoomEntity,
    dto::{participant::ParticipantDto, validation::validate_room_title},
    state::lifecycle::RoomStatus,
};

/// Payload used to create a room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    /// Free-text title, 1-100 characters after trimming.
    pub title: String,
}

impl Validate for CreateRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_room_title(&self.title) {
            errors.add("title", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Serialized view of a room row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomDto {
    /// Room identifier.
    pub id: Uuid,
    /// Room title.
    pub title: String,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    /// Wall-clock deadline.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: OffsetDateTime,
    /// Current lifecycle status.
    pub status: RoomStatus,
}

impl From<RoomEntity> for RoomDto {
    fn from(room: RoomEntity) -> Self {
        Self {
            id: room.id,
            title: room.title,
            created_at: room.created_at,
            expires_at: room.expires_at,
            status: room.status,
        }
    }
}

/// Response to room creation: the room plus its shareable URL.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRoomResponse {
    /// The freshly created room.
    pub room: RoomDto,
    /// Shareable link for joining the room.
    pub url: String,
}

/// Room snapshot: metadata, ordered participants, and who has voted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomDataResponse {
    /// Room metadata.
    pub room: RoomDto,
    /// Participants ordered by join time.
    pub participants: Vec<ParticipantDto>,
    /// Ids of participants that have already cast a vote.
    #[serde(rename = "votedParticipantIds")]
    pub voted_participant_ids: Vec<Uuid>,
}

/// Body of the lifecycle operations that act on behalf of a participant
/// (start, restart, cancel).
#[derive(Debug, Deserialize, ToSchema)]
pub struct ParticipantActionRequest {
    /// Id of the participant requesting the operation.
    #[serde(rename = "participantId")]
    pub participant_id: Uuid,
}

/// Generic acknowledgement for mutations without a richer payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct AckResponse {
    /// Always true on success.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

/// Acknowledgement of a lifecycle transition, carrying the new status.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChangeResponse {
    /// Always true on success.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
    /// Status the room transitioned to.
    #[serde(rename = "roomStatus")]
    pub room_status: RoomStatus,
}
