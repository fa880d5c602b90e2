//! Payment Repository
//!
//! 支付记录与预约状态在同一事务内写入：
//! 只有 `pending` 的预约会被置为 `paid`。

use super::{RepoError, RepoResult};
use shared::models::{Payment, PaymentStatus, Reservation};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, reservation_id, amount, payment_status, payment_date";

/// 记录一笔支付并把预约置为已支付
///
/// - 预约不存在 → `NotFound`
/// - 预约已支付 → `Duplicate`
/// - 预约已失败 → `Validation`
pub async fn record_paid(
    pool: &SqlitePool,
    reservation_id: i64,
    amount: f64,
) -> RepoResult<(Payment, Reservation)> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let reservation = sqlx::query_as::<_, Reservation>(
        "UPDATE reservations SET payment_status = 'paid', updated_at = ? \
         WHERE id = ? AND payment_status = 'pending' \
         RETURNING id, event_id, name, surname, queue_number, payment_status, created_at, updated_at",
    )
    .bind(now)
    .bind(reservation_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(reservation) = reservation else {
        let status: Option<PaymentStatus> =
            sqlx::query_scalar("SELECT payment_status FROM reservations WHERE id = ?")
                .bind(reservation_id)
                .fetch_optional(&mut *tx)
                .await?;
        return Err(match status {
            None => RepoError::NotFound(format!("Reservation {reservation_id} not found")),
            Some(PaymentStatus::Paid) => {
                RepoError::Duplicate(format!("Reservation {reservation_id} already paid"))
            }
            Some(other) => {
                RepoError::Validation(format!("Reservation {reservation_id} is {other}"))
            }
        });
    };

    let payment = sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (reservation_id, amount, payment_status, payment_date) \
         VALUES (?, ?, 'paid', ?) RETURNING {COLUMNS}"
    ))
    .bind(reservation_id)
    .bind(amount)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((payment, reservation))
}

pub async fn find_by_reservation(pool: &SqlitePool, reservation_id: i64) -> RepoResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payments WHERE reservation_id = ? ORDER BY payment_date DESC"
    ))
    .bind(reservation_id)
    .fetch_all(pool)
    .await?;
    Ok(payments)
}
