use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        participant::{JoinRoomRequest, JoinRoomResponse},
        results::ResultsResponse,
        room::{
            AckResponse, CreateRoomRequest, CreateRoomResponse, ParticipantActionRequest,
            RoomDataResponse, StatusChangeResponse,
        },
        vote::CastVoteRequest,
    },
    error::AppError,
    services::{participant_service, room_service, vote_service},
    state::SharedState,
};

/// Room lifecycle and voting endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/{id}", get(get_room).delete(delete_room))
        .route("/api/rooms/{id}/participants", post(join_room))
        .route("/api/rooms/{id}/start-voting", post(start_voting))
        .route("/api/rooms/{id}/vote", post(cast_vote))
        .route("/api/rooms/{id}/results", get(get_results))
        .route("/api/rooms/{id}/restart-voting", post(restart_voting))
        .route("/api/rooms/{id}/cancel-voting", post(cancel_voting))
}

/// Create a room and return its shareable URL.
#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = CreateRoomResponse),
        (status = 400, description = "Invalid title"),
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), AppError> {
    payload.validate()?;
    let response = room_service::create_room(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Retrieve a room snapshot: metadata, participants, and who has voted.
#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Room snapshot", body = RoomDataResponse),
        (status = 404, description = "Room not found"),
        (status = 410, description = "Room expired"),
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomDataResponse>, AppError> {
    Ok(Json(room_service::room_snapshot(&state, id).await?))
}

/// Delete a room together with its participants and votes.
#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 404, description = "Room not found"),
    )
)]
pub async fn delete_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    room_service::delete_room(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Join a room under a display name unique within the room.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/participants",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = JoinRoomRequest,
    responses(
        (status = 201, description = "Joined", body = JoinRoomResponse),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Name already taken or voting already started"),
        (status = 410, description = "Room expired"),
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<(StatusCode, Json<JoinRoomResponse>), AppError> {
    payload.validate()?;
    let response = participant_service::join_room(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Explicitly open the vote for a waiting room.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/start-voting",
    tag = "voting",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = ParticipantActionRequest,
    responses(
        (status = 200, description = "Voting started", body = StatusChangeResponse),
        (status = 400, description = "Not enough participants"),
        (status = 404, description = "Room or participant not found"),
        (status = 409, description = "Voting already started"),
    )
)]
pub async fn start_voting(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ParticipantActionRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    let status = room_service::start_voting(&state, id, payload.participant_id).await?;
    Ok(Json(StatusChangeResponse {
        success: true,
        message: "voting started".into(),
        room_status: status,
    }))
}

/// Cast a vote for a candidate in the same room.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/vote",
    tag = "voting",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = CastVoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = AckResponse),
        (status = 404, description = "Room, voter, or candidate not found"),
        (status = 409, description = "Already voted or voting completed"),
        (status = 410, description = "Room expired"),
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CastVoteRequest>,
) -> Result<Json<AckResponse>, AppError> {
    vote_service::cast_vote(&state, id, payload).await?;
    Ok(Json(AckResponse {
        success: true,
        message: "vote recorded".into(),
    }))
}

/// Current results: sorted tally, progress, and winners.
#[utoipa::path(
    get,
    path = "/api/rooms/{id}/results",
    tag = "voting",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Results snapshot", body = ResultsResponse),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Voting has not started"),
        (status = 410, description = "Room expired"),
    )
)]
pub async fn get_results(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, AppError> {
    Ok(Json(vote_service::get_results(&state, id).await?))
}

/// Clear a completed vote and return the room to waiting for a new round.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/restart-voting",
    tag = "voting",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = ParticipantActionRequest,
    responses(
        (status = 200, description = "Voting restarted", body = StatusChangeResponse),
        (status = 404, description = "Room or participant not found"),
        (status = 409, description = "Not every participant has voted"),
    )
)]
pub async fn restart_voting(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ParticipantActionRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    let status = room_service::restart_voting(&state, id, payload.participant_id).await?;
    Ok(Json(StatusChangeResponse {
        success: true,
        message: "voting restarted".into(),
        room_status: status,
    }))
}

/// Abort the current vote regardless of progress and clear the ledger.
#[utoipa::path(
    post,
    path = "/api/rooms/{id}/cancel-voting",
    tag = "voting",
    params(("id" = Uuid, Path, description = "Room identifier")),
    request_body = ParticipantActionRequest,
    responses(
        (status = 200, description = "Voting cancelled", body = AckResponse),
        (status = 404, description = "Room or participant not found"),
        (status = 410, description = "Room expired"),
    )
)]
pub async fn cancel_voting(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ParticipantActionRequest>,
) -> Result<Json<AckResponse>, AppError> {
    room_service::cancel_voting(&state, id, payload.participant_id).await?;
    Ok(Json(AckResponse {
        success: true,
        message: "voting cancelled".into(),
    }))
}
