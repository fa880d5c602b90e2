//! Admin API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::message::{ChangeAction, Table};
use shared::models::{
    Admin, LoginRequest, LoginResponse, Reservation, ReservationPage, TimeRange, VisitorChart,
    VisitorSummary,
};

use crate::analytics;
use crate::auth::{CurrentAdmin, verify_password};
use crate::core::ServerState;
use crate::db::repository::admin;
use crate::reservations::service;
use crate::security_log;
use crate::utils::{AppError, AppResult, ErrorCode};

/// POST /api/admin/login - 用户名密码登录，签发 JWT
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::invalid_credentials());
    }

    let Some(row) = admin::find_by_username(&state.pool, username).await? else {
        security_log!("WARN", "login_failed", username = username.to_string(), reason = "unknown_user");
        return Err(AppError::invalid_credentials());
    };

    let verified = verify_password(&req.password, &row.password_hash).map_err(|e| {
        tracing::error!(admin_id = row.id, error = %e, "Stored password hash is malformed");
        AppError::internal("Password verification failed")
    })?;
    if !verified {
        security_log!("WARN", "login_failed", username = username.to_string(), reason = "bad_password");
        return Err(AppError::invalid_credentials());
    }

    let issued = state
        .jwt_service
        .generate_token(row.id, &row.username)
        .map_err(|e| AppError::internal(format!("Failed to issue token: {e}")))?;

    security_log!("INFO", "login_succeeded", admin_id = row.id, username = row.username.clone());

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        admin: Admin::from(row),
    }))
}

/// GET /api/admin/me - 当前会话身份
pub async fn me(current: CurrentAdmin) -> Json<CurrentAdmin> {
    Json(current)
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/admin/reservations - 分页列表，最新的在前
pub async fn list_reservations(
    State(state): State<ServerState>,
    _current: CurrentAdmin,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ReservationPage>> {
    let page = service::list(&state.pool, query.page, query.per_page).await?;
    Ok(Json(page))
}

/// POST /api/admin/reservations/:id/fail - 标记支付失败
pub async fn mark_failed(
    State(state): State<ServerState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> AppResult<Json<Reservation>> {
    let r = service::mark_failed(&state.pool, id).await?;

    security_log!("INFO", "reservation_failed", admin = current.username.clone(), reservation_id = id);
    state.broadcast_sync(Table::Reservations, ChangeAction::Updated, id, Some(&r));

    Ok(Json(r))
}

#[derive(Debug, Deserialize)]
pub struct VisitorQuery {
    pub range: Option<String>,
    pub path: Option<String>,
}

impl VisitorQuery {
    fn resolve(self) -> AppResult<(TimeRange, String)> {
        let range = match self.range.as_deref() {
            None | Some("") => TimeRange::default(),
            Some(raw) => raw.parse::<TimeRange>().map_err(|e| {
                AppError::with_message(ErrorCode::InvalidTimeRange, e).with_detail("range", raw)
            })?,
        };
        let path = match self.path {
            Some(path) if !path.trim().is_empty() => analytics::normalize_path(&path)?,
            _ => analytics::DEFAULT_PATH.to_string(),
        };
        Ok((range, path))
    }
}

/// GET /api/admin/visitors/summary?range=&path=
pub async fn visitor_summary(
    State(state): State<ServerState>,
    _current: CurrentAdmin,
    Query(query): Query<VisitorQuery>,
) -> AppResult<Json<VisitorSummary>> {
    let (range, path) = query.resolve()?;
    Ok(Json(analytics::summary(&state.pool, range, &path).await?))
}

/// GET /api/admin/visitors/chart?range=&path=
pub async fn visitor_chart(
    State(state): State<ServerState>,
    _current: CurrentAdmin,
    Query(query): Query<VisitorQuery>,
) -> AppResult<Json<VisitorChart>> {
    let (range, path) = query.resolve()?;
    Ok(Json(analytics::chart(&state.pool, range, &path).await?))
}
