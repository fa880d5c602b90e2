//! Event Repository

use super::{RepoError, RepoResult};
use shared::models::{Event, EventCreate, EventUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, name, description, start_time, end_time, poster_url, created_at, updated_at";

/// All events, soonest first
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(&format!(
        "SELECT {COLUMNS} FROM events ORDER BY start_time ASC, id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(events)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Event>> {
    let event = sqlx::query_as::<_, Event>(&format!("SELECT {COLUMNS} FROM events WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(event)
}

pub async fn exists(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM events WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Insert a validated event. `start_time`/`end_time` must be present.
pub async fn create(
    pool: &SqlitePool,
    data: &EventCreate,
    poster_url: Option<&str>,
) -> RepoResult<Event> {
    let (Some(start_time), Some(end_time)) = (data.start_time, data.end_time) else {
        return Err(RepoError::Validation("start_time and end_time are required".into()));
    };
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO events (name, description, start_time, end_time, poster_url, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(start_time)
    .bind(end_time)
    .bind(poster_url)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create event".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &EventUpdate) -> RepoResult<Event> {
    let rows = sqlx::query(
        "UPDATE events SET name = COALESCE(?1, name), description = COALESCE(?2, description), \
         start_time = COALESCE(?3, start_time), end_time = COALESCE(?4, end_time), updated_at = ?5 \
         WHERE id = ?6",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.start_time)
    .bind(data.end_time)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Event {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Event {id} not found")))
}

/// Replace the poster URL, returning the updated event
pub async fn set_poster(pool: &SqlitePool, id: i64, poster_url: &str) -> RepoResult<Event> {
    let rows = sqlx::query("UPDATE events SET poster_url = ?, updated_at = ? WHERE id = ?")
        .bind(poster_url)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Event {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Event {id} not found")))
}

/// Rows removed together with an event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletedEvent {
    pub reservation_ids: Vec<i64>,
    pub payment_ids: Vec<i64>,
}

/// Delete an event; reservations and payments go with it (ON DELETE CASCADE)
///
/// Returns the ids of the cascaded rows, `None` when the event does not exist.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<Option<DeletedEvent>> {
    let mut tx = pool.begin().await?;

    let reservation_ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM reservations WHERE event_id = ? ORDER BY id")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
    let payment_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT p.id FROM payments p JOIN reservations r ON r.id = p.reservation_id \
         WHERE r.event_id = ? ORDER BY p.id",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    let rows = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Ok(None);
    }

    tx.commit().await?;
    Ok(Some(DeletedEvent {
        reservation_ids,
        payment_ids,
    }))
}
