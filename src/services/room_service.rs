//! Room lifecycle operations: creation, snapshots, status transitions,
//! deletion, and the expired-room purge.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{ParticipantEntity, RoomEntity},
        room_store::RoomStore,
    },
    dto::room::{CreateRoomRequest, CreateRoomResponse, RoomDataResponse, RoomDto},
    error::ServiceError,
    services::vote_service,
    state::{
        SharedState,
        lifecycle::{self, LifecycleEvent, RoomStatus},
    },
};

/// Create a room with the configured lifetime and return its share URL.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<CreateRoomResponse, ServiceError> {
    let store = state.require_room_store().await?;

    let now = OffsetDateTime::now_utc();
    let room = RoomEntity {
        id: Uuid::new_v4(),
        title: request.title.trim().to_string(),
        created_at: now,
        expires_at: now + state.config().room_lifetime,
        status: RoomStatus::Waiting,
    };
    store.insert_room(room.clone()).await?;

    info!(room_id = %room.id, title = %room.title, "room created");

    let url = format!(
        "{}/rooms/{}",
        state.config().public_base_url.trim_end_matches('/'),
        room.id
    );

    Ok(CreateRoomResponse {
        room: room.into(),
        url,
    })
}

/// Room snapshot: metadata, ordered participants, and who has voted.
pub async fn room_snapshot(
    state: &SharedState,
    room_id: Uuid,
) -> Result<RoomDataResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = load_live_room(&store, room_id).await?;

    let participants = store.list_participants(room_id).await?;
    let mut voted_participant_ids = store.voted_voter_ids(room_id).await?;
    voted_participant_ids.sort_unstable();

    Ok(RoomDataResponse {
        room: RoomDto::from(room),
        participants: participants.into_iter().map(Into::into).collect(),
        voted_participant_ids,
    })
}

/// Explicitly open the vote. Requires the caller to be a participant, the
/// room to still be waiting, and at least two participants.
pub async fn start_voting(
    state: &SharedState,
    room_id: Uuid,
    participant_id: Uuid,
) -> Result<RoomStatus, ServiceError> {
    let store = state.require_room_store().await?;
    let room = load_live_room(&store, room_id).await?;

    let next = lifecycle::transition(room.status, LifecycleEvent::StartVoting)
        .map_err(|_| ServiceError::InvalidState("voting has already started".into()))?;

    ensure_member(&store, room_id, participant_id, "requesting participant").await?;

    let participant_count = store.count_participants(room_id).await?;
    if participant_count < 2 {
        return Err(ServiceError::InvalidInput(
            "at least 2 participants are required to start voting".into(),
        ));
    }

    store.update_room_status(room_id, next).await?;
    info!(room_id = %room_id, "voting started");

    state.events().publish_room_changed(room_id);
    state.events().publish_results_changed(room_id);

    Ok(next)
}

/// Clear a completed vote and return the room to waiting for a re-run.
/// Only valid once every participant has voted.
pub async fn restart_voting(
    state: &SharedState,
    room_id: Uuid,
    participant_id: Uuid,
) -> Result<RoomStatus, ServiceError> {
    let store = state.require_room_store().await?;
    let room = load_live_room(&store, room_id).await?;

    let next = lifecycle::transition(room.status, LifecycleEvent::Restart)
        .map_err(|_| ServiceError::InvalidState("voting has not started".into()))?;

    ensure_member(&store, room_id, participant_id, "requesting participant").await?;

    let (voted_count, total_participants) = vote_service::vote_progress(&store, room_id).await?;
    if voted_count != total_participants || total_participants == 0 {
        return Err(ServiceError::InvalidState(
            "not every participant has voted yet".into(),
        ));
    }

    clear_votes_and_reset(state, &store, room_id, next).await?;
    info!(room_id = %room_id, "voting restarted");

    Ok(next)
}

/// Undo a vote that was started in error: clear all votes and return to
/// waiting, without requiring completeness.
pub async fn cancel_voting(
    state: &SharedState,
    room_id: Uuid,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let room = load_live_room(&store, room_id).await?;

    // Cancel is valid from any status; the transition cannot fail.
    let next = lifecycle::transition(room.status, LifecycleEvent::Cancel)
        .map_err(|err| ServiceError::InvalidState(err.to_string()))?;

    ensure_member(&store, room_id, participant_id, "requesting participant").await?;

    clear_votes_and_reset(state, &store, room_id, next).await?;
    info!(room_id = %room_id, "voting cancelled");

    Ok(())
}

/// Delete a room; the store cascades to its participants and votes.
pub async fn delete_room(state: &SharedState, room_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;

    if !store.delete_room(room_id).await? {
        return Err(ServiceError::NotFound("room not found".into()));
    }
    info!(room_id = %room_id, "room deleted");

    // Live sessions recompute on these signals, observe the missing room,
    // and terminate with their error event.
    state.events().publish_room_changed(room_id);
    state.events().publish_results_changed(room_id);

    Ok(())
}

/// Remove every room past its deadline. Returns the number purged.
pub async fn purge_expired(state: &SharedState) -> Result<u64, ServiceError> {
    let store = state.require_room_store().await?;
    let purged = store.purge_expired_rooms(OffsetDateTime::now_utc()).await?;
    if purged > 0 {
        info!(count = purged, "purged expired rooms");
    }
    Ok(purged)
}

/// Fetch a room and fail when it is missing or past its deadline. Expiry is
/// checked against the wall clock on every call; the stored status is never
/// trusted for liveness.
pub(crate) async fn load_live_room(
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
) -> Result<RoomEntity, ServiceError> {
    let Some(room) = store.find_room(room_id).await? else {
        return Err(ServiceError::NotFound("room not found".into()));
    };

    if room.is_expired(OffsetDateTime::now_utc()) {
        return Err(ServiceError::Expired("this room has expired".into()));
    }

    Ok(room)
}

/// Fail with not-found unless `participant_id` belongs to the room.
pub(crate) async fn ensure_member(
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
    participant_id: Uuid,
    role: &str,
) -> Result<ParticipantEntity, ServiceError> {
    store
        .find_participant(room_id, participant_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("{role} not found in this room")))
}

async fn clear_votes_and_reset(
    state: &SharedState,
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
    next: RoomStatus,
) -> Result<(), ServiceError> {
    store.delete_votes(room_id).await?;
    store.update_room_status(room_id, next).await?;

    state.events().publish_room_changed(room_id);
    state.events().publish_results_changed(room_id);

    Ok(())
}
