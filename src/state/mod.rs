//! Shared application state: storage slot, event bus, and session registry.

/// Change notification bus.
pub mod events;
/// Room lifecycle state machine.
pub mod lifecycle;
/// Live connection bookkeeping.
pub mod sessions;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::room_store::RoomStore,
    error::ServiceError,
    state::{events::RoomEventBus, sessions::SessionRegistry},
};

/// Shared handle to [`AppState`]; cloning bumps the inner `Arc`.
pub type SharedState = Arc<AppState>;

/// Central application state. Created once at process start and passed by
/// handle to every component that publishes, subscribes, or persists.
pub struct AppState {
    config: AppConfig,
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    events: RoomEventBus,
    sessions: SessionRegistry,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let events = RoomEventBus::new(config.event_channel_capacity);
        Arc::new(Self {
            config,
            room_store: RwLock::new(None),
            events,
            sessions: SessionRegistry::new(),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the room store or fail with the degraded-mode error.
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        self.room_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_room_store(&self) {
        {
            let mut guard = self.room_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.room_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Change notification bus shared by services and realtime sessions.
    pub fn events(&self) -> &RoomEventBus {
        &self.events
    }

    /// Registry of live realtime connections.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}
