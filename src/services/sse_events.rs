//! Builders for the events pushed over SSE.
//!
//! Snapshot events carry the same JSON bodies as the corresponding REST
//! responses, so a client renders pushed and polled data through one code
//! path.

use serde::Serialize;
use tracing::warn;

use crate::dto::{
    room::RoomDataResponse,
    sse::{
        ERROR_EVENT, EXPIRED_EVENT, ErrorNotice, ExpiredNotice, RESULTS_UPDATE_EVENT,
        ROOM_UPDATE_EVENT, ServerEvent,
    },
};

/// Room snapshot event.
pub fn room_update(snapshot: &RoomDataResponse) -> Option<ServerEvent> {
    build(ROOM_UPDATE_EVENT, snapshot)
}

/// Results snapshot event.
pub fn results_update(results: &impl Serialize) -> Option<ServerEvent> {
    build(RESULTS_UPDATE_EVENT, results)
}

/// Terminal event announcing that the room's deadline passed.
pub fn expired() -> Option<ServerEvent> {
    build(
        EXPIRED_EVENT,
        &ExpiredNotice {
            message: "this room has expired".into(),
        },
    )
}

/// Error event carrying a human-readable reason.
pub fn stream_error(reason: &str) -> Option<ServerEvent> {
    build(
        ERROR_EVENT,
        &ErrorNotice {
            error: reason.to_string(),
        },
    )
}

fn build(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}
