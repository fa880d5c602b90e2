//! 统一错误处理
//!
//! 错误类型定义在 `shared::error`，这里补充服务端特有的转换：
//! multipart 解析错误、I/O 错误等。
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::new(ErrorCode::EventNotFound))
//!
//! // 返回成功响应
//! Ok(Json(event))
//! ```

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use axum::extract::multipart::MultipartError;

/// multipart 读取失败 → 400，超出请求体上限 → 413
pub fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == http::StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::new(ErrorCode::FileTooLarge);
    }
    AppError::invalid(format!("Invalid multipart body: {e}"))
}

/// 文件系统错误 → 存储失败
pub fn storage_error(e: std::io::Error) -> AppError {
    tracing::error!(error = %e, "File storage failed");
    AppError::new(ErrorCode::FileStorageFailed)
}
