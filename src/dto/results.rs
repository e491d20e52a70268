//! Results and tally payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::room::RoomDto, services::tally::TallyEntry};

/// One candidate's line in the sorted tally.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TallyEntryDto {
    /// Candidate participant id.
    pub id: Uuid,
    /// Candidate display name.
    pub name: String,
    /// Number of votes received.
    pub vote_count: u64,
    /// Display rank; tied candidates share a rank.
    pub rank: u32,
}

impl From<TallyEntry> for TallyEntryDto {
    fn from(entry: TallyEntry) -> Self {
        Self {
            id: entry.participant_id,
            name: entry.name,
            vote_count: entry.vote_count,
            rank: entry.rank,
        }
    }
}

/// Progress of the vote.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatusDto {
    /// Distinct participants that have voted.
    pub voted_count: u64,
    /// Participants currently in the room.
    pub total_participants: u64,
    /// True when every participant has voted and the room is not empty.
    pub is_complete: bool,
}

/// Results snapshot: sorted tally, progress, and winners.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResultsResponse {
    /// Room metadata, with derived completion reflected in the status.
    pub room: RoomDto,
    /// Tally sorted by vote count descending, name ascending.
    pub results: Vec<TallyEntryDto>,
    /// Vote progress.
    #[serde(rename = "voteStatus")]
    pub vote_status: VoteStatusDto,
    /// Every candidate at the maximum vote count, empty when no votes exist.
    pub winners: Vec<TallyEntryDto>,
}
