//! Health check payloads.

use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/health` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a storage backend is currently installed.
    pub storage: bool,
}

impl HealthResponse {
    /// Health response for a fully operational backend.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            storage: true,
        }
    }

    /// Health response while running without storage.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            storage: false,
        }
    }
}
