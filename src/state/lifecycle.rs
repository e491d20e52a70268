//! Room lifecycle state machine: waiting → voting → completed, with restart/cancel
//! transitions back to waiting.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Accepting participants; no votes recorded yet.
    Waiting,
    /// Participants may vote; joining is closed.
    Voting,
    /// Every current participant has voted.
    Completed,
}

impl RoomStatus {
    /// Canonical lowercase string form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Voting => "voting",
            RoomStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string from the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown room status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for RoomStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(RoomStatus::Waiting),
            "voting" => Ok(RoomStatus::Voting),
            "completed" => Ok(RoomStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Events that can be applied to a room's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A participant explicitly opens the vote.
    StartVoting,
    /// A vote is recorded; the first one opens the vote implicitly.
    CastVote,
    /// The distinct-voter count has reached the participant count.
    AllVoted,
    /// A fully completed vote is cleared for a re-run.
    Restart,
    /// An accidentally started vote is undone.
    Cancel,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from}")]
pub struct InvalidTransition {
    /// The status the room was in when the invalid event was received.
    pub from: RoomStatus,
    /// The event that cannot be applied from this status.
    pub event: LifecycleEvent,
}

/// Compute the status a room moves to when `event` is applied while in `from`.
///
/// Only encodes the status table; preconditions that depend on data
/// (participant counts, completeness, caller membership, expiry) are the
/// services' responsibility.
pub fn transition(from: RoomStatus, event: LifecycleEvent) -> Result<RoomStatus, InvalidTransition> {
    let next = match (from, event) {
        (RoomStatus::Waiting, LifecycleEvent::StartVoting) => RoomStatus::Voting,
        (RoomStatus::Waiting, LifecycleEvent::CastVote) => RoomStatus::Voting,
        (RoomStatus::Voting, LifecycleEvent::CastVote) => RoomStatus::Voting,
        (RoomStatus::Voting, LifecycleEvent::AllVoted) => RoomStatus::Completed,
        (RoomStatus::Voting, LifecycleEvent::Restart) => RoomStatus::Waiting,
        (RoomStatus::Completed, LifecycleEvent::Restart) => RoomStatus::Waiting,
        (_, LifecycleEvent::Cancel) => RoomStatus::Waiting,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}
