//! Queue Server - 活动排队预约服务
//!
//! # 架构概述
//!
//! - **预约** (`reservations`): 分配每个活动内唯一的排队号
//! - **实时同步** (`realtime`): 按表广播变更，本地视图自动同步
//! - **数据库** (`db`): 嵌入式 SQLite (sqlx)
//! - **认证** (`auth`): JWT + Argon2 管理员会话
//! - **中转** (`relay`): 转账凭证验证接口代理
//! - **HTTP API** (`api`): RESTful API 与 WebSocket
//!
//! # 模块结构
//!
//! ```text
//! queue-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # JWT 认证、密码哈希
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层
//! ├── reservations/  # 预约流程
//! ├── realtime/      # ChangeHub 与 SyncedView
//! ├── relay/         # EasySlip 中转
//! ├── storage/       # 海报存储
//! ├── analytics/     # 访客统计
//! └── utils/         # 日志、错误
//! ```

pub mod analytics;
pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod realtime;
pub mod relay;
pub mod reservations;
pub mod storage;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentAdmin, JwtService};
pub use core::{Config, Server, ServerState, build_app};
pub use realtime::{ChangeHub, SyncMode, SyncedView, ViewSource};
pub use reservations::ReservationFlow;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
  ____
 / __ \__  _____  __  _____
/ / / / / / / _ \/ / / / _ \
/ /_/ / /_/ /  __/ /_/ /  __/
\___\_\__,_/\___/\__,_/\___/
    "#
    );
}
