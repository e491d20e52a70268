//! Vote casting and results computation.
//!
//! Completion is derived from the counts every time results are read; the
//! persisted status is only a cache that gets refreshed here.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{models::VoteEntity, room_store::RoomStore},
    dto::{
        results::{ResultsResponse, VoteStatusDto},
        room::RoomDto,
        vote::CastVoteRequest,
    },
    error::ServiceError,
    services::{room_service, tally},
    state::{
        SharedState,
        lifecycle::{self, LifecycleEvent, RoomStatus},
    },
};

/// Record one participant's vote for a candidate in the same room.
///
/// The first vote flips a waiting room into voting. Double votes are not
/// pre-checked; the store's uniqueness constraint is the single authority
/// and its violation surfaces as a conflict.
pub async fn cast_vote(
    state: &SharedState,
    room_id: Uuid,
    request: CastVoteRequest,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::load_live_room(&store, room_id).await?;

    let next = lifecycle::transition(room.status, LifecycleEvent::CastVote)
        .map_err(|_| ServiceError::InvalidState("voting has already completed".into()))?;

    room_service::ensure_member(&store, room_id, request.participant_id, "voter").await?;
    room_service::ensure_member(&store, room_id, request.selected_participant_id, "candidate")
        .await?;

    store
        .insert_vote(VoteEntity {
            id: Uuid::new_v4(),
            room_id,
            voter_id: request.participant_id,
            candidate_id: request.selected_participant_id,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;

    info!(room_id = %room_id, voter_id = %request.participant_id, "vote cast");

    if room.status != next {
        store.update_room_status(room_id, next).await?;
        state.events().publish_room_changed(room_id);
    }
    state.events().publish_results_changed(room_id);

    Ok(())
}

/// Current results: sorted tally, progress, winners, and the room with its
/// derived status. Rejected while the room is still waiting.
pub async fn get_results(
    state: &SharedState,
    room_id: Uuid,
) -> Result<ResultsResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::load_live_room(&store, room_id).await?;

    if room.status == RoomStatus::Waiting {
        return Err(ServiceError::InvalidState(
            "voting has not started yet".into(),
        ));
    }

    let rows = store.tally_votes(room_id).await?;
    let (voted_count, total_participants) = vote_progress(&store, room_id).await?;
    let summary = tally::summarize(rows, voted_count, total_participants);

    let mut room = room;
    if summary.is_complete && room.status == RoomStatus::Voting {
        let next = lifecycle::transition(room.status, LifecycleEvent::AllVoted)
            .map_err(|err| ServiceError::InvalidState(err.to_string()))?;
        store.update_room_status(room_id, next).await?;
        room.status = next;
        info!(room_id = %room_id, "voting completed");
        state.events().publish_room_changed(room_id);
    }

    Ok(ResultsResponse {
        room: RoomDto::from(room),
        results: summary.entries.into_iter().map(Into::into).collect(),
        vote_status: VoteStatusDto {
            voted_count: summary.voted_count,
            total_participants: summary.total_participants,
            is_complete: summary.is_complete,
        },
        winners: summary.winners.into_iter().map(Into::into).collect(),
    })
}

/// Distinct voters so far and the current participant count.
pub(crate) async fn vote_progress(
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
) -> Result<(u64, u64), ServiceError> {
    let voted = store.voted_voter_ids(room_id).await?.len() as u64;
    let total = store.count_participants(room_id).await?;
    Ok((voted, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::RoomEntity, room_store::memory::MemoryRoomStore},
        dto::{participant::JoinRoomRequest, room::CreateRoomRequest},
        services::participant_service,
        state::AppState,
    };
    use time::Duration;

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        state
    }

    /// Create a room and join the given names, returning their ids in order.
    async fn seed_room(state: &SharedState, names: &[&str]) -> (Uuid, Vec<Uuid>) {
        let created = room_service::create_room(
            state,
            CreateRoomRequest {
                title: "Lunch".into(),
            },
        )
        .await
        .unwrap();

        let mut ids = Vec::new();
        for name in names {
            let joined = participant_service::join_room(
                state,
                created.room.id,
                JoinRoomRequest { name: (*name).into() },
            )
            .await
            .unwrap();
            ids.push(joined.participant.id);
        }
        (created.room.id, ids)
    }

    fn vote(voter: Uuid, candidate: Uuid) -> CastVoteRequest {
        CastVoteRequest {
            participant_id: voter,
            selected_participant_id: candidate,
        }
    }

    #[tokio::test]
    async fn first_vote_flips_waiting_to_voting() {
        let state = test_state().await;
        let (room_id, ids) = seed_room(&state, &["Alice", "Bob"]).await;

        cast_vote(&state, room_id, vote(ids[0], ids[1])).await.unwrap();

        let snapshot = room_service::room_snapshot(&state, room_id).await.unwrap();
        assert_eq!(snapshot.room.status, RoomStatus::Voting);
        assert_eq!(snapshot.voted_participant_ids, vec![ids[0]]);
    }

    #[tokio::test]
    async fn duplicate_vote_is_rejected_and_counts_are_unchanged() {
        let state = test_state().await;
        let (room_id, ids) = seed_room(&state, &["Alice", "Bob"]).await;

        cast_vote(&state, room_id, vote(ids[0], ids[1])).await.unwrap();
        let err = cast_vote(&state, room_id, vote(ids[0], ids[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let results = get_results(&state, room_id).await.unwrap();
        assert_eq!(results.vote_status.voted_count, 1);
    }

    #[tokio::test]
    async fn three_way_cycle_is_a_full_tie() {
        let state = test_state().await;
        let (room_id, ids) = seed_room(&state, &["Alice", "Bob", "Carol"]).await;
        let (alice, bob, carol) = (ids[0], ids[1], ids[2]);

        cast_vote(&state, room_id, vote(alice, bob)).await.unwrap();
        cast_vote(&state, room_id, vote(bob, carol)).await.unwrap();
        cast_vote(&state, room_id, vote(carol, alice)).await.unwrap();

        let results = get_results(&state, room_id).await.unwrap();
        assert!(results.vote_status.is_complete);
        assert_eq!(results.room.status, RoomStatus::Completed);
        assert_eq!(results.winners.len(), 3);
        assert!(results.results.iter().all(|entry| entry.rank == 1));
        let names: Vec<&str> = results.results.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
    }

    #[tokio::test]
    async fn results_are_idempotent_once_completed() {
        let state = test_state().await;
        let (room_id, ids) = seed_room(&state, &["Alice", "Bob"]).await;

        cast_vote(&state, room_id, vote(ids[0], ids[1])).await.unwrap();
        cast_vote(&state, room_id, vote(ids[1], ids[1])).await.unwrap();

        let first = get_results(&state, room_id).await.unwrap();
        let second = get_results(&state, room_id).await.unwrap();
        assert_eq!(first.room.status, RoomStatus::Completed);
        assert_eq!(second.room.status, RoomStatus::Completed);
        assert_eq!(second.winners.len(), 1);
        assert_eq!(second.winners[0].name, "Bob");
    }

    #[tokio::test]
    async fn results_are_rejected_while_waiting() {
        let state = test_state().await;
        let (room_id, _) = seed_room(&state, &["Alice", "Bob"]).await;

        let err = get_results(&state, room_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn votes_in_expired_rooms_are_rejected() {
        let state = test_state().await;
        let store = state.room_store().await.unwrap();
        let now = OffsetDateTime::now_utc();
        let room_id = Uuid::new_v4();
        store
            .insert_room(RoomEntity {
                id: room_id,
                title: "Stale".into(),
                created_at: now - Duration::hours(1),
                expires_at: now - Duration::minutes(30),
                status: RoomStatus::Voting,
            })
            .await
            .unwrap();

        let err = cast_vote(&state, room_id, vote(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Expired(_)));
    }

    #[tokio::test]
    async fn restart_requires_every_participant_to_have_voted() {
        let state = test_state().await;
        let (room_id, ids) = seed_room(&state, &["Alice", "Bob", "Carol"]).await;

        cast_vote(&state, room_id, vote(ids[0], ids[1])).await.unwrap();
        let err = room_service::restart_voting(&state, room_id, ids[0])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        cast_vote(&state, room_id, vote(ids[1], ids[2])).await.unwrap();
        cast_vote(&state, room_id, vote(ids[2], ids[0])).await.unwrap();
        let status = room_service::restart_voting(&state, room_id, ids[0])
            .await
            .unwrap();
        assert_eq!(status, RoomStatus::Waiting);

        // A fresh round: the old ledger is gone and results are gated again.
        let snapshot = room_service::room_snapshot(&state, room_id).await.unwrap();
        assert!(snapshot.voted_participant_ids.is_empty());
        assert!(get_results(&state, room_id).await.is_err());
    }

    #[tokio::test]
    async fn cancel_works_mid_vote() {
        let state = test_state().await;
        let (room_id, ids) = seed_room(&state, &["Alice", "Bob", "Carol"]).await;

        cast_vote(&state, room_id, vote(ids[0], ids[1])).await.unwrap();
        room_service::cancel_voting(&state, room_id, ids[1])
            .await
            .unwrap();

        let snapshot = room_service::room_snapshot(&state, room_id).await.unwrap();
        assert_eq!(snapshot.room.status, RoomStatus::Waiting);
        assert!(snapshot.voted_participant_ids.is_empty());
    }

    #[tokio::test]
    async fn self_votes_count() {
        let state = test_state().await;
        let (room_id, ids) = seed_room(&state, &["Alice", "Bob"]).await;

        cast_vote(&state, room_id, vote(ids[0], ids[0])).await.unwrap();
        cast_vote(&state, room_id, vote(ids[1], ids[0])).await.unwrap();

        let results = get_results(&state, room_id).await.unwrap();
        assert_eq!(results.winners.len(), 1);
        assert_eq!(results.winners[0].name, "Alice");
        assert_eq!(results.winners[0].vote_count, 2);
    }

    #[tokio::test]
    async fn start_voting_needs_two_participants_and_membership() {
        let state = test_state().await;
        let (room_id, ids) = seed_room(&state, &["Alice"]).await;

        let err = room_service::start_voting(&state, room_id, ids[0])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = room_service::start_voting(&state, room_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
