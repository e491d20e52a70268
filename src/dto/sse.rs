//! Server-sent event payloads.

use serde::Serialize;
use utoipa::ToSchema;

/// Event name for room snapshots.
pub const ROOM_UPDATE_EVENT: &str = "room-update";
/// Event name for results snapshots.
pub const RESULTS_UPDATE_EVENT: &str = "results-update";
/// Terminal event name sent when the room's deadline passed.
pub const EXPIRED_EVENT: &str = "expired";
/// Terminal event name sent when a snapshot could not be computed.
pub const ERROR_EVENT: &str = "error";

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE streams.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Body of the terminal `expired` event.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExpiredNotice {
    /// Human-readable reason shown to the user.
    pub message: String,
}

/// Body of the `error` event.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorNotice {
    /// Human-readable description of what failed.
    pub error: String,
}
