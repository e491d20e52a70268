use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/api/rooms/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses((status = 200, description = "Room snapshot stream", content_type = "text/event-stream", body = String))
)]
/// Stream room snapshots: one immediately, then one per change, until the
/// room expires or disappears.
pub async fn room_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    sse_service::room_stream(&state, id)
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}/results/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Room identifier")),
    responses((status = 200, description = "Results snapshot stream", content_type = "text/event-stream", body = String))
)]
/// Stream results snapshots for a room.
pub async fn results_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    sse_service::results_stream(&state, id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/api/rooms/{id}/events", get(room_events))
        .route("/api/rooms/{id}/results/events", get(results_events))
}
