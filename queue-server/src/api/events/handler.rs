//! Event API Handlers

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use shared::message::{ChangeAction, Table};
use shared::models::Event;
use std::time::Duration;

use super::form::{EventForm, EventUpdateRequest};
use crate::auth::CurrentAdmin;
use crate::core::ServerState;
use crate::db::repository::event;
use crate::security_log;
use crate::utils::{AppError, AppResult, ErrorCode};

/// 目录视图追上最新版本的最长等待时间
const CATALOG_WAIT: Duration = Duration::from_millis(500);

fn event_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::EventNotFound).with_detail("event_id", id)
}

/// GET /api/events - 全部活动，按开始时间升序
///
/// 优先读取同步视图；视图上次读取失败时先重试一次，
/// 仍未同步或未追上最新变更时回退到数据库。
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Event>>> {
    let version = state.hub.version(Table::Events);
    if !state.catalog.is_in_sync() {
        state.catalog.refresh().await;
    }
    if state.catalog.is_in_sync() && state.catalog.wait_for_version(version, CATALOG_WAIT).await {
        return Ok(Json(state.catalog.snapshot().await));
    }

    tracing::debug!(version, "Event catalog behind, reading from database");
    let events = event::find_all(&state.pool).await?;
    Ok(Json(events))
}

/// GET /api/events/:id - 获取单个活动
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Event>> {
    let e = event::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| event_not_found(id))?;
    Ok(Json(e))
}

/// POST /api/events - 创建活动 (multipart，可附带海报)
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentAdmin,
    multipart: Multipart,
) -> AppResult<Json<Event>> {
    let (payload, poster) = EventForm::read(multipart).await?.into_create()?;

    let poster_url = match poster {
        Some(file) => Some(state.posters.store(&file.file_name, file.data).await?.public_url),
        None => None,
    };

    let e = event::create(&state.pool, &payload, poster_url.as_deref()).await?;

    security_log!("INFO", "event_created", admin = current.username.clone(), event_id = e.id);
    state.broadcast_sync(Table::Events, ChangeAction::Created, e.id, Some(&e));

    Ok(Json(e))
}

/// PUT /api/events/:id - 更新活动
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<EventUpdateRequest>,
) -> AppResult<Json<Event>> {
    let existing = event::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| event_not_found(id))?;
    let update = payload.into_update(&existing)?;

    let e = event::update(&state.pool, id, &update)
        .await
        .map_err(|err| match err {
            crate::db::repository::RepoError::NotFound(_) => event_not_found(id),
            other => other.into(),
        })?;

    security_log!("INFO", "event_updated", admin = current.username.clone(), event_id = id);
    state.broadcast_sync(Table::Events, ChangeAction::Updated, id, Some(&e));

    Ok(Json(e))
}

/// POST /api/events/:id/poster - 替换海报
pub async fn replace_poster(
    State(state): State<ServerState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<Event>> {
    if !event::exists(&state.pool, id).await? {
        return Err(event_not_found(id));
    }

    let file = EventForm::read(multipart)
        .await?
        .poster
        .ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;
    let stored = state.posters.store(&file.file_name, file.data).await?;

    let e = event::set_poster(&state.pool, id, &stored.public_url).await?;

    security_log!("INFO", "event_poster_replaced", admin = current.username.clone(), event_id = id);
    state.broadcast_sync(Table::Events, ChangeAction::Updated, id, Some(&e));

    Ok(Json(e))
}

/// DELETE /api/events/:id - 删除活动 (预约与支付级联删除)
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let Some(removed) = event::delete(&state.pool, id).await? else {
        return Err(event_not_found(id));
    };

    security_log!(
        "INFO",
        "event_deleted",
        admin = current.username.clone(),
        event_id = id,
        reservations = removed.reservation_ids.len(),
        payments = removed.payment_ids.len()
    );

    // 级联删除的行同样通知各自的表
    for payment_id in removed.payment_ids {
        state.broadcast_sync::<Event>(Table::Payments, ChangeAction::Deleted, payment_id, None);
    }
    for reservation_id in removed.reservation_ids {
        state.broadcast_sync::<Event>(Table::Reservations, ChangeAction::Deleted, reservation_id, None);
    }
    state.broadcast_sync::<Event>(Table::Events, ChangeAction::Deleted, id, None);

    Ok(Json(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::db::DbService;
    use shared::models::EventCreate;

    #[tokio::test]
    async fn test_list_recovers_when_catalog_mount_failed() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbService::in_memory().await.unwrap();
        let pool = db.pool.clone();

        // 挂载时 events 表不可读，目录的首次拉取失败
        sqlx::query("ALTER TABLE events RENAME TO events_hidden")
            .execute(&pool)
            .await
            .unwrap();
        let state = ServerState::for_tests(Config::for_tests(dir.path().to_string_lossy()), db)
            .await
            .unwrap();
        assert!(!state.catalog.is_in_sync());

        sqlx::query("ALTER TABLE events_hidden RENAME TO events")
            .execute(&pool)
            .await
            .unwrap();
        let created = event::create(
            &pool,
            &EventCreate {
                name: "Open Day".into(),
                description: None,
                start_time: Some(1_000),
                end_time: Some(2_000),
            },
            None,
        )
        .await
        .unwrap();

        let Json(events) = list(State(state.clone())).await.unwrap();
        assert_eq!(events, vec![created]);
        assert!(state.catalog.is_in_sync());
    }
}
