//! Realtime WebSocket endpoint
//!
//! GET /api/realtime/{table}?token=<JWT>
//! 浏览器 WebSocket 不支持自定义 headers，管理员令牌通过 query parameter 传递；
//! `events` / `visitors` 无需令牌。
//!
//! 协议 (Server → View):
//! - `{"type":"ready","table":…}` 订阅建立
//! - `{"type":"change",…}` 每条 [`ChangeEvent`](shared::message::ChangeEvent)
//! - `{"type":"resync","table":…}` 接收方落后，需要全量重新拉取

use axum::{
    Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::message::{RealtimeFrame, Table};
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::authenticate_token;
use crate::core::ServerState;
use crate::utils::{AppError, ErrorCode};

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/realtime/{table}", get(subscribe))
}

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    token: Option<String>,
}

/// GET /api/realtime/:table
async fn subscribe(
    State(state): State<ServerState>,
    Path(table): Path<String>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let table = table.parse::<Table>().map_err(|e| {
        AppError::with_message(ErrorCode::NotFound, e).with_detail("resource", "table")
    })?;

    if !table.is_public() {
        let token = query
            .token
            .as_deref()
            .ok_or_else(AppError::not_authenticated)?;
        let current = authenticate_token(&state, token).await?;
        tracing::debug!(admin_id = current.id, table = %table, "Admin realtime subscription");
    }

    Ok(ws.on_upgrade(move |socket| realtime_session(socket, state, table)))
}

async fn realtime_session(socket: WebSocket, state: ServerState, table: Table) {
    let (mut sink, mut stream) = socket.split();

    // 先订阅再发送 Ready，避免丢失中间的变更
    let mut subscription = state.hub.subscribe(table);
    tracing::info!(table = %table, "Realtime view connected");

    if send_frame(&mut sink, &RealtimeFrame::Ready { table }).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            change = subscription.recv() => {
                match change {
                    Ok(change) => {
                        if send_frame(&mut sink, &RealtimeFrame::Change(change)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(table = %table, lagged = n, "Realtime view lagged, requesting resync");
                        if send_frame(&mut sink, &RealtimeFrame::Resync { table }).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(table = %table, "Realtime view disconnected");
}

async fn send_frame<S>(sink: &mut S, frame: &RealtimeFrame) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(frame).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
