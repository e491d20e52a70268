//! HTTP route trees.

use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document routes.
pub mod docs;
/// Health check routes.
pub mod health;
/// Room lifecycle and voting routes.
pub mod rooms;
/// Realtime SSE routes.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router().merge(sse::router()).merge(rooms::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
