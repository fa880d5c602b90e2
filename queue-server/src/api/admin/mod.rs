//! Admin API 模块
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /api/admin/login | POST | 无 |
//! | /api/admin/me | GET | 管理员 |
//! | /api/admin/reservations | GET | 管理员 |
//! | /api/admin/reservations/{id}/fail | POST | 管理员 |
//! | /api/admin/visitors/summary | GET | 管理员 |
//! | /api/admin/visitors/chart | GET | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/me", get(handler::me))
        .route("/reservations", get(handler::list_reservations))
        .route("/reservations/{id}/fail", post(handler::mark_failed))
        .route("/visitors/summary", get(handler::visitor_summary))
        .route("/visitors/chart", get(handler::visitor_chart))
}
