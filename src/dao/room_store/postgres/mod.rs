//! PostgreSQL [`RoomStore`] backend.
//!
//! The unique indexes created by [`PgRoomStore::ensure_schema`] are the
//! authoritative arbiters for duplicate names and duplicate votes; inserts
//! are attempted directly and the unique-violation response is mapped to a
//! domain conflict instead of pre-checking.
//!
//! [`RoomStore`]: crate::dao::room_store::RoomStore

mod store;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::dao::storage::{StorageError, StorageResult};

/// Index backing participant-name uniqueness per room.
const PARTICIPANT_NAME_CONSTRAINT: &str = "participants_room_name_idx";
/// Index backing one-vote-per-voter uniqueness per room.
const VOTE_VOTER_CONSTRAINT: &str = "votes_room_voter_idx";

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS rooms (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        status TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS participants (
        id UUID PRIMARY KEY,
        room_id UUID NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        joined_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS participants_room_name_idx
        ON participants (room_id, name)",
    "CREATE TABLE IF NOT EXISTS votes (
        id UUID PRIMARY KEY,
        room_id UUID NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        voter_id UUID NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
        candidate_id UUID NOT NULL REFERENCES participants(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS votes_room_voter_idx
        ON votes (room_id, voter_id)",
];

/// Store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgRoomStore {
    pool: PgPool,
}

/// Open a connection pool against `database_url`.
pub async fn connect(database_url: &str) -> StorageResult<PgRoomStore> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|err| StorageError::unavailable("connecting to PostgreSQL".into(), err))?;

    Ok(PgRoomStore { pool })
}

impl PgRoomStore {
    /// Create the three tables and their unique indexes when missing.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|err| StorageError::unavailable("creating schema".into(), err))?;
        }
        Ok(())
    }
}
