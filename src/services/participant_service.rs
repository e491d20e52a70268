//! Participant membership: joining rooms while they are still open.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::ParticipantEntity,
    dto::participant::{JoinRoomRequest, JoinRoomResponse},
    error::ServiceError,
    services::room_service,
    state::{SharedState, lifecycle::RoomStatus},
};

/// Join a room under a display name that is unique within the room.
///
/// Joining is only allowed while the room is waiting; uniqueness of the name
/// is enforced by the store, not checked up front.
pub async fn join_room(
    state: &SharedState,
    room_id: Uuid,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    let store = state.require_room_store().await?;
    let room = room_service::load_live_room(&store, room_id).await?;

    if room.status != RoomStatus::Waiting {
        return Err(ServiceError::InvalidState(
            "voting has already started in this room".into(),
        ));
    }

    let participant = ParticipantEntity {
        id: Uuid::new_v4(),
        room_id,
        name: request.name.trim().to_string(),
        joined_at: time::OffsetDateTime::now_utc(),
    };
    store.insert_participant(participant.clone()).await?;

    info!(room_id = %room_id, participant_id = %participant.id, "participant joined");

    state.events().publish_room_changed(room_id);

    Ok(JoinRoomResponse {
        participant: participant.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::room_store::memory::MemoryRoomStore,
        dto::room::CreateRoomRequest,
        state::AppState,
    };
    use std::sync::Arc;

    async fn seeded_room(state: &SharedState) -> Uuid {
        room_service::create_room(
            state,
            CreateRoomRequest {
                title: "Lunch".into(),
            },
        )
        .await
        .unwrap()
        .room
        .id
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected_per_room() {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        let room_id = seeded_room(&state).await;

        join_room(&state, room_id, JoinRoomRequest { name: "Alice".into() })
            .await
            .unwrap();
        let err = join_room(&state, room_id, JoinRoomRequest { name: "Alice".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let other = seeded_room(&state).await;
        join_room(&state, other, JoinRoomRequest { name: "Alice".into() })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn joining_is_closed_once_voting_starts() {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        let room_id = seeded_room(&state).await;

        let alice = join_room(&state, room_id, JoinRoomRequest { name: "Alice".into() })
            .await
            .unwrap()
            .participant
            .id;
        join_room(&state, room_id, JoinRoomRequest { name: "Bob".into() })
            .await
            .unwrap();
        room_service::start_voting(&state, room_id, alice)
            .await
            .unwrap();

        let err = join_room(&state, room_id, JoinRoomRequest { name: "Carol".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
