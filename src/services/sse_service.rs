//! Realtime session management over SSE.
//!
//! One spawned forwarder task per connection bridges the room's broadcast
//! channel to the HTTP response stream. Signals only wake the forwarder; the
//! pushed payload is always a fresh snapshot recomputed from the store, so a
//! lagged receiver loses nothing but intermediate wake-ups.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{room_service, sse_events, vote_service},
    state::{
        SharedState,
        events::{EventCategory, RoomSignal},
    },
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Open a room snapshot stream: pushes the current snapshot immediately and
/// again on every change until the room expires or disappears.
pub fn room_stream(
    state: &SharedState,
    room_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    open_stream(state, room_id, EventCategory::Room)
}

/// Open a results snapshot stream for a room.
pub fn results_stream(
    state: &SharedState,
    room_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    open_stream(state, room_id, EventCategory::Results)
}

fn open_stream(
    state: &SharedState,
    room_id: Uuid,
    category: EventCategory,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let connection_id = Uuid::new_v4();
    let receiver = state.events().subscribe(room_id, category);
    state.sessions().register(connection_id, room_id, category);
    info!(%room_id, %connection_id, ?category, "SSE stream connected");

    // Small bounded channel between the forwarder and the response body.
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);
    let state = state.clone();
    tokio::spawn(run_session(state, connection_id, room_id, category, receiver, tx));

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

/// Whether the forwarder keeps running after a push attempt.
#[derive(PartialEq, Eq)]
enum SessionFlow {
    Continue,
    Stop,
}

async fn run_session(
    state: SharedState,
    connection_id: Uuid,
    room_id: Uuid,
    category: EventCategory,
    mut receiver: broadcast::Receiver<RoomSignal>,
    tx: mpsc::Sender<Result<Event, Infallible>>,
) {
    // Initial snapshot so the client has data before the first change.
    let mut flow = push_snapshot(&state, connection_id, room_id, category, &tx).await;

    let mut expiry_ticker = tokio::time::interval(state.config().expiry_check_interval);
    expiry_ticker.tick().await;

    while flow == SessionFlow::Continue {
        tokio::select! {
            _ = tx.closed() => break,
            _ = expiry_ticker.tick() => {
                // The ticker proves the forwarder is running; refresh the
                // activity stamp so the sweep only removes dead connections.
                state.sessions().touch(connection_id);
                // The Expired signal comes back through the receiver below,
                // terminating every stream of the room, not just this one.
                publish_if_expired(&state, room_id).await;
                if !state.sessions().is_alive(connection_id) {
                    // Removed by the inactivity sweep.
                    break;
                }
            }
            signal = receiver.recv() => match signal {
                Ok(RoomSignal::Changed) | Err(RecvError::Lagged(_)) => {
                    flow = push_snapshot(&state, connection_id, room_id, category, &tx).await;
                }
                Ok(RoomSignal::Expired) => {
                    send(&tx, sse_events::expired()).await;
                    break;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    state.sessions().deregister(connection_id);
    // Our own receiver still counts against the idle check; it has to go
    // before the release can remove the room's entry.
    drop(receiver);
    state.events().release_if_idle(room_id);
    info!(%room_id, %connection_id, "SSE stream disconnected");
}

/// Recompute and push the category's snapshot. Missing and expired rooms end
/// the stream with their terminal event; transient storage trouble surfaces
/// as an error event but keeps the stream open for a later retry.
async fn push_snapshot(
    state: &SharedState,
    connection_id: Uuid,
    room_id: Uuid,
    category: EventCategory,
    tx: &mpsc::Sender<Result<Event, Infallible>>,
) -> SessionFlow {
    let snapshot = match category {
        EventCategory::Room => room_service::room_snapshot(state, room_id)
            .await
            .map(|payload| sse_events::room_update(&payload)),
        EventCategory::Results => vote_service::get_results(state, room_id)
            .await
            .map(|payload| sse_events::results_update(&payload)),
    };

    match snapshot {
        Ok(event) => {
            if !send(tx, event).await {
                return SessionFlow::Stop;
            }
            state.sessions().touch(connection_id);
            SessionFlow::Continue
        }
        Err(ServiceError::NotFound(message)) => {
            send(tx, sse_events::stream_error(&message)).await;
            SessionFlow::Stop
        }
        Err(ServiceError::Expired(_)) => {
            send(tx, sse_events::expired()).await;
            SessionFlow::Stop
        }
        // A results stream opened before the first vote: nothing to push yet,
        // the next change signal will try again.
        Err(ServiceError::InvalidState(_)) => SessionFlow::Continue,
        Err(err) => {
            debug!(%room_id, error = %err, "snapshot recomputation failed");
            if send(tx, sse_events::stream_error("temporary server error")).await {
                SessionFlow::Continue
            } else {
                SessionFlow::Stop
            }
        }
    }
}

/// Check the room's deadline and announce expiry on the bus when it passed.
async fn publish_if_expired(state: &SharedState, room_id: Uuid) -> bool {
    let Some(store) = state.room_store().await else {
        return false;
    };
    match store.find_room(room_id).await {
        Ok(Some(room)) if room.is_expired(time::OffsetDateTime::now_utc()) => {
            state.events().publish_expired(room_id);
            true
        }
        _ => false,
    }
}

/// Forward one event into the response channel; false when the client is gone.
async fn send(tx: &mpsc::Sender<Result<Event, Infallible>>, event: Option<ServerEvent>) -> bool {
    let Some(payload) = event else {
        return true;
    };
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    tx.send(Ok(event)).await.is_ok()
}

/// Periodically drop connections with no successful push inside the timeout.
/// Runs for the process lifetime; spawned once at startup.
pub async fn run_connection_sweep(state: SharedState) {
    let mut ticker = tokio::time::interval(state.config().connection_sweep_interval);
    loop {
        ticker.tick().await;
        let removed = state.sessions().sweep_idle(state.config().connection_timeout);
        if !removed.is_empty() {
            info!(count = removed.len(), "swept idle SSE connections");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::RoomEntity,
            room_store::memory::MemoryRoomStore,
        },
        state::{AppState, lifecycle::RoomStatus},
    };
    use std::sync::Arc;
    use time::{Duration as TimeDuration, OffsetDateTime};

    async fn state_with_store() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn expiry_probe_announces_on_the_bus() {
        let state = state_with_store().await;
        let store = state.room_store().await.unwrap();
        let now = OffsetDateTime::now_utc();
        let room_id = Uuid::new_v4();
        store
            .insert_room(RoomEntity {
                id: room_id,
                title: "Stale".into(),
                created_at: now - TimeDuration::hours(1),
                expires_at: now - TimeDuration::minutes(1),
                status: RoomStatus::Waiting,
            })
            .await
            .unwrap();

        let mut rx = state.events().subscribe(room_id, EventCategory::Room);
        assert!(publish_if_expired(&state, room_id).await);
        assert_eq!(rx.recv().await.unwrap(), RoomSignal::Expired);
    }

    async fn insert_live_room(state: &SharedState, room_id: Uuid) {
        let store = state.room_store().await.unwrap();
        let now = OffsetDateTime::now_utc();
        store
            .insert_room(RoomEntity {
                id: room_id,
                title: "Lunch".into(),
                created_at: now,
                expires_at: now + TimeDuration::minutes(30),
                status: RoomStatus::Waiting,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn forwarder_pushes_a_snapshot_and_terminates_on_expiry() {
        let state = state_with_store().await;
        let room_id = Uuid::new_v4();
        insert_live_room(&state, room_id).await;

        let receiver = state.events().subscribe(room_id, EventCategory::Room);
        let connection_id = Uuid::new_v4();
        state
            .sessions()
            .register(connection_id, room_id, EventCategory::Room);
        let (tx, mut rx) = mpsc::channel(8);
        let session = tokio::spawn(run_session(
            state.clone(),
            connection_id,
            room_id,
            EventCategory::Room,
            receiver,
            tx,
        ));

        // Initial snapshot arrives before any signal.
        assert!(rx.recv().await.is_some());

        state.events().publish_expired(room_id);
        // Terminal expired event, then the channel closes.
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());

        session.await.unwrap();
        assert!(!state.sessions().is_alive(connection_id));
        assert_eq!(state.events().tracked_rooms(), 0);
    }

    #[tokio::test]
    async fn last_stream_of_a_missing_room_releases_the_bus_entry() {
        let state = state_with_store().await;
        let response = room_stream(&state, Uuid::new_v4());

        // The forwarder pushes the terminal error and tears down on its own.
        for _ in 0..100 {
            if state.sessions().is_empty() && state.events().tracked_rooms() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(state.sessions().is_empty());
        assert_eq!(state.events().tracked_rooms(), 0);
        drop(response);
    }

    #[tokio::test]
    async fn expiry_ticker_counts_as_activity_for_the_sweep() {
        let mut config = AppConfig::default();
        config.expiry_check_interval = Duration::from_millis(10);
        let state = AppState::new(config);
        state
            .install_room_store(Arc::new(MemoryRoomStore::new()))
            .await;
        let room_id = Uuid::new_v4();
        insert_live_room(&state, room_id).await;

        let receiver = state.events().subscribe(room_id, EventCategory::Room);
        let connection_id = Uuid::new_v4();
        state
            .sessions()
            .register(connection_id, room_id, EventCategory::Room);
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(run_session(
            state.clone(),
            connection_id,
            room_id,
            EventCategory::Room,
            receiver,
            tx,
        ));
        assert!(rx.recv().await.is_some());

        // The room stays quiet, but the ticker keeps the entry fresh.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let removed = state.sessions().sweep_idle(Duration::from_millis(50));
        assert!(removed.is_empty());
        assert!(state.sessions().is_alive(connection_id));
    }

    #[tokio::test]
    async fn expiry_probe_ignores_live_and_missing_rooms() {
        let state = state_with_store().await;
        let store = state.room_store().await.unwrap();
        let now = OffsetDateTime::now_utc();
        let room_id = Uuid::new_v4();
        store
            .insert_room(RoomEntity {
                id: room_id,
                title: "Fresh".into(),
                created_at: now,
                expires_at: now + TimeDuration::minutes(30),
                status: RoomStatus::Waiting,
            })
            .await
            .unwrap();

        assert!(!publish_if_expired(&state, room_id).await);
        assert!(!publish_if_expired(&state, Uuid::new_v4()).await);
    }
}
