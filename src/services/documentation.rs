use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the voting room backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::delete_room,
        crate::routes::rooms::join_room,
        crate::routes::rooms::start_voting,
        crate::routes::rooms::cast_vote,
        crate::routes::rooms::get_results,
        crate::routes::rooms::restart_voting,
        crate::routes::rooms::cancel_voting,
        crate::routes::sse::room_events,
        crate::routes::sse::results_events,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::RoomDto,
            crate::dto::room::RoomDataResponse,
            crate::dto::room::ParticipantActionRequest,
            crate::dto::room::AckResponse,
            crate::dto::room::StatusChangeResponse,
            crate::dto::participant::JoinRoomRequest,
            crate::dto::participant::JoinRoomResponse,
            crate::dto::participant::ParticipantDto,
            crate::dto::vote::CastVoteRequest,
            crate::dto::results::TallyEntryDto,
            crate::dto::results::VoteStatusDto,
            crate::dto::results::ResultsResponse,
            crate::dto::sse::ExpiredNotice,
            crate::dto::sse::ErrorNotice,
            crate::state::lifecycle::RoomStatus,
        )
    ),
    tags(
        (name = "rooms", description = "Room lifecycle and membership"),
        (name = "voting", description = "Vote casting and results"),
        (name = "sse", description = "Server-sent event streams"),
        (name = "health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
