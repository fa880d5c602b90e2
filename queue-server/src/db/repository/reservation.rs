//! Reservation Repository
//!
//! `(event_id, queue_number)` is UNIQUE; [`insert`] reports a lost race
//! as [`RepoError::Duplicate`](super::RepoError::Duplicate) so the booking flow can retry.

use super::RepoResult;
use shared::models::{PaymentStatus, Reservation, ReservationDetail};
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, event_id, name, surname, queue_number, payment_status, created_at, updated_at";

/// Highest queue number issued for an event, `None` when it has no bookings
pub async fn max_queue_number(pool: &SqlitePool, event_id: i64) -> RepoResult<Option<i64>> {
    let max: Option<i64> =
        sqlx::query_scalar("SELECT MAX(queue_number) FROM reservations WHERE event_id = ?")
            .bind(event_id)
            .fetch_one(pool)
            .await?;
    Ok(max)
}

/// Insert a pending reservation with an explicit queue number
pub async fn insert(
    pool: &SqlitePool,
    event_id: i64,
    name: &str,
    surname: Option<&str>,
    queue_number: i64,
) -> RepoResult<Reservation> {
    let now = shared::util::now_millis();
    let reservation = sqlx::query_as::<_, Reservation>(&format!(
        "INSERT INTO reservations (event_id, name, surname, queue_number, payment_status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 'pending', ?, ?) RETURNING {COLUMNS}"
    ))
    .bind(event_id)
    .bind(name)
    .bind(surname)
    .bind(queue_number)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(reservation)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Reservation>> {
    let reservation = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(reservation)
}

/// Reservation joined with its event name
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<ReservationDetail>> {
    let detail = sqlx::query_as::<_, ReservationDetail>(
        "SELECT r.id, r.event_id, r.name, r.surname, r.queue_number, r.payment_status, \
                r.created_at, r.updated_at, e.name AS event_name \
         FROM reservations r JOIN events e ON e.id = r.event_id \
         WHERE r.id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(detail)
}

/// One page of reservations, newest first
pub async fn list_page(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<ReservationDetail>> {
    let rows = sqlx::query_as::<_, ReservationDetail>(
        "SELECT r.id, r.event_id, r.name, r.surname, r.queue_number, r.payment_status, \
                r.created_at, r.updated_at, e.name AS event_name \
         FROM reservations r JOIN events e ON e.id = r.event_id \
         ORDER BY r.created_at DESC, r.id DESC \
         LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Transition `from` → `to`. Returns `None` when the row is missing or not in `from`.
pub async fn transition_status(
    pool: &SqlitePool,
    id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
) -> RepoResult<Option<Reservation>> {
    let reservation = sqlx::query_as::<_, Reservation>(&format!(
        "UPDATE reservations SET payment_status = ?, updated_at = ? \
         WHERE id = ? AND payment_status = ? RETURNING {COLUMNS}"
    ))
    .bind(to)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(from)
    .fetch_optional(pool)
    .await?;
    Ok(reservation)
}
