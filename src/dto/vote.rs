//! Vote payloads.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Payload used to cast a vote.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CastVoteRequest {
    /// Voting participant.
    #[serde(rename = "participantId")]
    pub participant_id: Uuid,
    /// Chosen candidate; may equal the voter (self-votes are allowed).
    #[serde(rename = "selectedParticipantId")]
    pub selected_participant_id: Uuid,
}
