//! Participant payloads.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{dao::models::ParticipantEntity, dto::validation::validate_participant_name};

/// Payload used to join a room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRoomRequest {
    /// Display name, unique within the room, 1-50 characters after trimming.
    pub name: String,
}

impl Validate for JoinRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(err) = validate_participant_name(&self.name) {
            errors.add("name", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Serialized view of a participant row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantDto {
    /// Participant identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Join timestamp.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub joined_at: OffsetDateTime,
}

impl From<ParticipantEntity> for ParticipantDto {
    fn from(participant: ParticipantEntity) -> Self {
        Self {
            id: participant.id,
            name: participant.name,
            joined_at: participant.joined_at,
        }
    }
}

/// Response to a successful join.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRoomResponse {
    /// The freshly created participant; the caller stores its id client-side.
    pub participant: ParticipantDto,
}
