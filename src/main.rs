//! Voting room backend entrypoint wiring REST, SSE, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use votem_back::{
    config::AppConfig,
    routes,
    services::{room_service, sse_service},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    spawn_storage(&app_state).await;
    tokio::spawn(run_room_purge(app_state.clone()));
    tokio::spawn(sse_service::run_connection_sweep(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the storage backend: a supervised PostgreSQL connection when the
/// `postgres-store` feature is on, an in-memory store otherwise.
#[cfg(feature = "postgres-store")]
async fn spawn_storage(state: &SharedState) {
    use votem_back::{
        dao::room_store::{RoomStore, postgres},
        services::storage_supervisor,
    };

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost:5432/votem".into());

    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let url = database_url.clone();
        async move {
            let store = postgres::connect(&url).await?;
            store.ensure_schema().await?;
            Ok(Arc::new(store) as Arc<dyn RoomStore>)
        }
    }));
}

#[cfg(not(feature = "postgres-store"))]
async fn spawn_storage(state: &SharedState) {
    use votem_back::dao::room_store::memory::MemoryRoomStore;

    state
        .install_room_store(Arc::new(MemoryRoomStore::new()))
        .await;
    info!("using in-memory storage backend");
}

/// Periodically remove rooms past their deadline.
async fn run_room_purge(state: SharedState) {
    let mut ticker = tokio::time::interval(state.config().room_purge_interval);
    loop {
        ticker.tick().await;
        if let Err(err) = room_service::purge_expired(&state).await {
            debug!(error = %err, "room purge skipped");
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
