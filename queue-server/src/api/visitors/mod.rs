//! 访客统计写入 (公开)

use axum::{Json, Router, extract::State, routing::post};
use shared::message::{ChangeAction, Table};
use shared::models::{VisitorHit, VisitorHitCreate};

use crate::analytics;
use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/visitors", post(record))
}

/// POST /api/visitors - 记录一次页面访问
async fn record(
    State(state): State<ServerState>,
    Json(payload): Json<VisitorHitCreate>,
) -> AppResult<Json<VisitorHit>> {
    let hit = analytics::record_hit(&state.pool, &payload.path).await?;
    state.broadcast_sync(Table::Visitors, ChangeAction::Created, hit.id, Some(&hit));
    Ok(Json(hit))
}
