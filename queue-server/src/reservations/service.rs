//! 预约查询、支付与状态变更

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    PaymentReceipt, PaymentStatus, Reservation, ReservationConfirmation, ReservationPage,
};
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, payment, reservation};

/// 管理后台默认每页条数
pub const DEFAULT_PAGE_SIZE: i64 = 5;
/// 每页条数上限
pub const MAX_PAGE_SIZE: i64 = 100;

fn reservation_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::ReservationNotFound).with_detail("reservation_id", id)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Reservation> {
    reservation::find_by_id(pool, id)
        .await?
        .ok_or_else(|| reservation_not_found(id))
}

/// 确认页 / 二维码所需数据
pub async fn confirmation(pool: &SqlitePool, id: i64) -> AppResult<ReservationConfirmation> {
    let detail = reservation::find_detail(pool, id)
        .await?
        .ok_or_else(|| reservation_not_found(id))?;
    let r = detail.reservation;

    Ok(ReservationConfirmation {
        reservation_id: r.id,
        event_id: r.event_id,
        event_name: detail.event_name,
        queue_number: r.queue_number,
        name: r.name,
        surname: r.surname,
        payment_status: r.payment_status,
        qr_value: ReservationConfirmation::qr_value_for(r.id),
    })
}

/// 请求金额，缺省时使用配置的预约价格
pub fn resolve_amount(requested: Option<f64>, default_price: f64) -> AppResult<f64> {
    let amount = requested.unwrap_or(default_price);
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::new(ErrorCode::PaymentInvalidAmount).with_detail("amount", amount));
    }
    Ok(amount)
}

/// 支付：写入支付记录并把预约置为 paid (同一事务)
pub async fn pay(pool: &SqlitePool, id: i64, amount: f64) -> AppResult<PaymentReceipt> {
    let (payment, reservation) = payment::record_paid(pool, id, amount)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => reservation_not_found(id),
            RepoError::Duplicate(_) => {
                AppError::new(ErrorCode::ReservationAlreadyPaid).with_detail("reservation_id", id)
            }
            RepoError::Validation(msg) => {
                AppError::with_message(ErrorCode::ReservationNotPending, msg)
                    .with_detail("reservation_id", id)
            }
            other => other.into(),
        })?;

    tracing::info!(
        reservation_id = id,
        payment_id = payment.id,
        amount,
        "Reservation paid"
    );
    Ok(PaymentReceipt {
        payment,
        reservation,
    })
}

/// 管理员把待支付预约标记为失败
pub async fn mark_failed(pool: &SqlitePool, id: i64) -> AppResult<Reservation> {
    match reservation::transition_status(pool, id, PaymentStatus::Pending, PaymentStatus::Failed)
        .await?
    {
        Some(updated) => {
            tracing::info!(reservation_id = id, "Reservation marked failed");
            Ok(updated)
        }
        None => {
            let current = get(pool, id).await?;
            Err(AppError::with_message(
                ErrorCode::ReservationNotPending,
                format!("Reservation is {}", current.payment_status),
            )
            .with_detail("reservation_id", id))
        }
    }
}

/// 分页列表，最新的在前
pub async fn list(
    pool: &SqlitePool,
    page: Option<i64>,
    per_page: Option<i64>,
) -> AppResult<ReservationPage> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::validation("page must be >= 1").with_detail("page", page));
    }
    let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let total = reservation::count(pool).await?;
    let items = reservation::list_page(pool, per_page, (page - 1) * per_page).await?;

    Ok(ReservationPage {
        items,
        total,
        page,
        per_page,
        total_pages: (total + per_page - 1) / per_page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::event;
    use shared::models::EventCreate;

    async fn setup() -> (DbService, i64) {
        let db = DbService::in_memory().await.unwrap();
        let event = event::create(
            &db.pool,
            &EventCreate {
                name: "Expo".into(),
                description: None,
                start_time: Some(1_000),
                end_time: Some(2_000),
            },
            None,
        )
        .await
        .unwrap();
        (db, event.id)
    }

    #[tokio::test]
    async fn test_confirmation_carries_qr_value() {
        let (db, event_id) = setup().await;
        let r = reservation::insert(&db.pool, event_id, "Ann", Some("Lee"), 1).await.unwrap();

        let c = confirmation(&db.pool, r.id).await.unwrap();
        assert_eq!(c.event_name, "Expo");
        assert_eq!(c.queue_number, 1);
        assert_eq!(c.qr_value, format!("reservation:{}", r.id));

        let err = confirmation(&db.pool, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationNotFound);
    }

    #[tokio::test]
    async fn test_pay_transitions_once() {
        let (db, event_id) = setup().await;
        let r = reservation::insert(&db.pool, event_id, "Ann", None, 1).await.unwrap();

        let receipt = pay(&db.pool, r.id, 100.0).await.unwrap();
        assert_eq!(receipt.reservation.payment_status, PaymentStatus::Paid);
        assert_eq!(receipt.payment.amount, 100.0);
        assert_eq!(receipt.payment.payment_status, PaymentStatus::Paid);

        let err = pay(&db.pool, r.id, 100.0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationAlreadyPaid);
        assert_eq!(payment::find_by_reservation(&db.pool, r.id).await.unwrap().len(), 1);

        let err = pay(&db.pool, 999, 100.0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationNotFound);
    }

    #[tokio::test]
    async fn test_failed_reservation_cannot_be_paid() {
        let (db, event_id) = setup().await;
        let r = reservation::insert(&db.pool, event_id, "Ann", None, 1).await.unwrap();

        let failed = mark_failed(&db.pool, r.id).await.unwrap();
        assert_eq!(failed.payment_status, PaymentStatus::Failed);

        let err = pay(&db.pool, r.id, 100.0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationNotPending);
        let err = mark_failed(&db.pool, r.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationNotPending);
    }

    #[test]
    fn test_resolve_amount() {
        assert_eq!(resolve_amount(None, 100.0).unwrap(), 100.0);
        assert_eq!(resolve_amount(Some(250.5), 100.0).unwrap(), 250.5);
        for bad in [0.0, -1.0, f64::NAN] {
            assert_eq!(
                resolve_amount(Some(bad), 100.0).unwrap_err().code,
                ErrorCode::PaymentInvalidAmount
            );
        }
    }

    #[tokio::test]
    async fn test_list_pages() {
        let (db, event_id) = setup().await;
        for n in 1..=7 {
            reservation::insert(&db.pool, event_id, &format!("V{n}"), None, n).await.unwrap();
        }

        let first = list(&db.pool, None, None).await.unwrap();
        assert_eq!(first.total, 7);
        assert_eq!(first.per_page, DEFAULT_PAGE_SIZE);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items.len(), 5);
        assert_eq!(first.items[0].reservation.name, "V7");

        let second = list(&db.pool, Some(2), None).await.unwrap();
        assert_eq!(second.items.len(), 2);

        let capped = list(&db.pool, Some(1), Some(1_000)).await.unwrap();
        assert_eq!(capped.per_page, MAX_PAGE_SIZE);

        let err = list(&db.pool, Some(0), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
