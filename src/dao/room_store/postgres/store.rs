//! [`RoomStore`] implementation over the PostgreSQL pool.

use futures::future::BoxFuture;
use sqlx::{PgPool, Row, postgres::PgRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dao::{
        models::{ParticipantEntity, RoomEntity, TallyRowEntity, VoteEntity},
        room_store::{
            RoomStore,
            postgres::{PARTICIPANT_NAME_CONSTRAINT, PgRoomStore, VOTE_VOTER_CONSTRAINT},
        },
        storage::{ConflictKind, StorageError, StorageResult},
    },
    state::lifecycle::RoomStatus,
};

/// Map a query failure, surfacing unique violations as domain conflicts.
fn map_query_err(context: &str, err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(PARTICIPANT_NAME_CONSTRAINT) => {
                    return StorageError::Conflict(ConflictKind::DuplicateName);
                }
                Some(VOTE_VOTER_CONSTRAINT) => {
                    return StorageError::Conflict(ConflictKind::DuplicateVote);
                }
                _ => {}
            }
        }
    }
    StorageError::unavailable(context.to_string(), err)
}

fn room_from_row(row: &PgRow) -> StorageResult<RoomEntity> {
    let status: String = row
        .try_get("status")
        .map_err(|err| StorageError::unavailable("reading room row".into(), err))?;
    let status: RoomStatus = status
        .parse()
        .map_err(|err| StorageError::unavailable("parsing room status".into(), err))?;

    Ok(RoomEntity {
        id: get(row, "id")?,
        title: get(row, "title")?,
        created_at: get(row, "created_at")?,
        expires_at: get(row, "expires_at")?,
        status,
    })
}

fn participant_from_row(row: &PgRow) -> StorageResult<ParticipantEntity> {
    Ok(ParticipantEntity {
        id: get(row, "id")?,
        room_id: get(row, "room_id")?,
        name: get(row, "name")?,
        joined_at: get(row, "joined_at")?,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|err| StorageError::unavailable(format!("reading column `{column}`"), err))
}

impl PgRoomStore {
    fn pool(&self) -> PgPool {
        self.pool.clone()
    }
}

impl RoomStore for PgRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let pool = self.pool();
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO rooms (id, title, created_at, expires_at, status)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(room.id)
            .bind(&room.title)
            .bind(room.created_at)
            .bind(room.expires_at)
            .bind(room.status.as_str())
            .execute(&pool)
            .await
            .map_err(|err| map_query_err("inserting room", err))?;
            Ok(())
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let pool = self.pool();
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id, title, created_at, expires_at, status FROM rooms WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(|err| map_query_err("fetching room", err))?;

            row.as_ref().map(room_from_row).transpose()
        })
    }

    fn update_room_status(
        &self,
        id: Uuid,
        status: RoomStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let pool = self.pool();
        Box::pin(async move {
            let result = sqlx::query("UPDATE rooms SET status = $1 WHERE id = $2")
                .bind(status.as_str())
                .bind(id)
                .execute(&pool)
                .await
                .map_err(|err| map_query_err("updating room status", err))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn delete_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let pool = self.pool();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
                .bind(id)
                .execute(&pool)
                .await
                .map_err(|err| map_query_err("deleting room", err))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn purge_expired_rooms(&self, now: OffsetDateTime) -> BoxFuture<'static, StorageResult<u64>> {
        let pool = self.pool();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM rooms WHERE expires_at < $1")
                .bind(now)
                .execute(&pool)
                .await
                .map_err(|err| map_query_err("purging expired rooms", err))?;
            Ok(result.rows_affected())
        })
    }

    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let pool = self.pool();
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO participants (id, room_id, name, joined_at)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(participant.id)
            .bind(participant.room_id)
            .bind(&participant.name)
            .bind(participant.joined_at)
            .execute(&pool)
            .await
            .map_err(|err| map_query_err("inserting participant", err))?;
            Ok(())
        })
    }

    fn find_participant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let pool = self.pool();
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id, room_id, name, joined_at FROM participants
                 WHERE id = $1 AND room_id = $2",
            )
            .bind(participant_id)
            .bind(room_id)
            .fetch_optional(&pool)
            .await
            .map_err(|err| map_query_err("fetching participant", err))?;

            row.as_ref().map(participant_from_row).transpose()
        })
    }

    fn list_participants(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let pool = self.pool();
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, room_id, name, joined_at FROM participants
                 WHERE room_id = $1 ORDER BY joined_at ASC, id ASC",
            )
            .bind(room_id)
            .fetch_all(&pool)
            .await
            .map_err(|err| map_query_err("listing participants", err))?;

            rows.iter().map(participant_from_row).collect()
        })
    }

    fn count_participants(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let pool = self.pool();
        Box::pin(async move {
            let row = sqlx::query("SELECT COUNT(*) AS count FROM participants WHERE room_id = $1")
                .bind(room_id)
                .fetch_one(&pool)
                .await
                .map_err(|err| map_query_err("counting participants", err))?;
            let count: i64 = get(&row, "count")?;
            Ok(count.max(0) as u64)
        })
    }

    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let pool = self.pool();
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO votes (id, room_id, voter_id, candidate_id, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(vote.id)
            .bind(vote.room_id)
            .bind(vote.voter_id)
            .bind(vote.candidate_id)
            .bind(vote.created_at)
            .execute(&pool)
            .await
            .map_err(|err| map_query_err("inserting vote", err))?;
            Ok(())
        })
    }

    fn delete_votes(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let pool = self.pool();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM votes WHERE room_id = $1")
                .bind(room_id)
                .execute(&pool)
                .await
                .map_err(|err| map_query_err("deleting votes", err))?;
            Ok(result.rows_affected())
        })
    }

    fn tally_votes(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TallyRowEntity>>> {
        let pool = self.pool();
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT p.id, p.name, COUNT(v.id) AS vote_count
                 FROM participants p
                 LEFT JOIN votes v ON v.candidate_id = p.id AND v.room_id = $1
                 WHERE p.room_id = $1
                 GROUP BY p.id, p.name",
            )
            .bind(room_id)
            .fetch_all(&pool)
            .await
            .map_err(|err| map_query_err("tallying votes", err))?;

            rows.iter()
                .map(|row| {
                    Ok(TallyRowEntity {
                        participant_id: get(row, "id")?,
                        name: get(row, "name")?,
                        vote_count: get(row, "vote_count")?,
                    })
                })
                .collect()
        })
    }

    fn voted_voter_ids(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let pool = self.pool();
        Box::pin(async move {
            let rows = sqlx::query("SELECT DISTINCT voter_id FROM votes WHERE room_id = $1")
                .bind(room_id)
                .fetch_all(&pool)
                .await
                .map_err(|err| map_query_err("listing voters", err))?;

            rows.iter().map(|row| get(row, "voter_id")).collect()
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let pool = self.pool();
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&pool)
                .await
                .map_err(|err| map_query_err("pinging database", err))?;
            Ok(())
        })
    }
}
