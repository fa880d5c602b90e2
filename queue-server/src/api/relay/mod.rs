//! 转账凭证验证中转接口
//!
//! `POST /api/easyslip`：请求体原样转发，上游状态码与 JSON 原样返回；
//! 网络失败或上游返回非 JSON 时固定返回 500 `{"message":"Server Error"}`。

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use http::StatusCode;
use serde_json::{Value, json};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/easyslip", post(forward))
}

async fn forward(State(state): State<ServerState>, Json(body): Json<Value>) -> Response {
    match state.relay.forward(&body).await {
        Ok(upstream) => {
            let status =
                StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(upstream.body)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, upstream = %state.relay.api_url(), "Slip relay failed");
            server_error()
        }
    }
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Server Error" })),
    )
        .into_response()
}
