//! 启动与运行错误
//!
//! 请求级错误统一使用 [`AppError`](crate::utils::AppError)，
//! 这里只覆盖进程级别的失败 (配置、目录、数据库、监听端口)。

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::relay::RelayError;
use crate::utils::AppError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("工作目录错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("数据库初始化失败: {0}")]
    Database(AppError),

    #[error("中转客户端初始化失败: {0}")]
    Relay(#[from] RelayError),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
