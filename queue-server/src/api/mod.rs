//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`events`] - 活动 (列表公开，管理需认证)
//! - [`reservations`] - 预约、确认页、支付
//! - [`admin`] - 登录、预约管理、访客统计
//! - [`visitors`] - 访客记录
//! - [`posters`] - 海报文件
//! - [`relay`] - 转账凭证验证中转
//! - [`realtime`] - WebSocket 变更订阅

pub mod admin;
pub mod events;
pub mod health;
pub mod posters;
pub mod realtime;
pub mod relay;
pub mod reservations;
pub mod visitors;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// 全部路由 (未绑定 state)
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(events::router())
        .merge(reservations::router())
        .merge(admin::router())
        .merge(visitors::router())
        .merge(posters::router())
        .merge(relay::router())
        .merge(realtime::router())
}
