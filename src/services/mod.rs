/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Participant membership operations.
pub mod participant_service;
/// Room lifecycle operations.
pub mod room_service;
/// Server-sent event message generation.
pub mod sse_events;
/// Realtime session management over SSE.
pub mod sse_service;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
/// Pure tally math: ordering, ranks, winners, completion.
pub mod tally;
/// Vote casting and results computation.
pub mod vote_service;
