//! Persistence layer: storage abstraction and backends.

/// Database entity definitions.
pub mod models;
/// Room/participant/vote storage backends.
pub mod room_store;
/// Storage error types shared by all backends.
pub mod storage;
