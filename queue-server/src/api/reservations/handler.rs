//! Reservation API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::message::{ChangeAction, Table};
use shared::models::{
    PaymentCreate, PaymentReceipt, Reservation, ReservationConfirmation, ReservationCreate,
};

use crate::core::ServerState;
use crate::relay::SlipRequest;
use crate::reservations::service;
use crate::utils::AppResult;

/// POST /api/reservations - 预约并分配排队号
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ReservationCreate>,
) -> AppResult<Json<Reservation>> {
    let r = state.flow.book(payload).await?;
    state.broadcast_sync(Table::Reservations, ChangeAction::Created, r.id, Some(&r));
    Ok(Json(r))
}

/// GET /api/reservations/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    Ok(Json(service::get(&state.pool, id).await?))
}

/// GET /api/reservations/:id/confirmation - 确认页 / 二维码数据
pub async fn confirmation(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ReservationConfirmation>> {
    Ok(Json(service::confirmation(&state.pool, id).await?))
}

/// POST /api/reservations/:id/payment - 支付
///
/// 成功后异步通知凭证验证接口，通知结果不影响响应。
pub async fn pay(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<PaymentReceipt>> {
    let amount = service::resolve_amount(payload.amount, state.config.booking_price)?;
    let receipt = service::pay(&state.pool, id, amount).await?;

    state.broadcast_sync(
        Table::Payments,
        ChangeAction::Created,
        receipt.payment.id,
        Some(&receipt.payment),
    );
    state.broadcast_sync(
        Table::Reservations,
        ChangeAction::Updated,
        id,
        Some(&receipt.reservation),
    );

    spawn_slip_notification(&state, &receipt);

    Ok(Json(receipt))
}

fn spawn_slip_notification(state: &ServerState, receipt: &PaymentReceipt) {
    let relay = state.relay.clone();
    let reservation = &receipt.reservation;
    let reservation_id = reservation.id;
    let request = SlipRequest::for_booking(
        &state.config.slip.company_id,
        &reservation.name,
        reservation.surname.as_deref(),
        reservation.queue_number,
        receipt.payment.amount,
    );

    tokio::spawn(async move {
        relay.notify_payment(reservation_id, request).await;
    });
}
