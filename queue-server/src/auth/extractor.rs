//! JWT Extractor
//!
//! 受保护接口直接在参数中声明 [`CurrentAdmin`] 即可：
//! 校验 Bearer 令牌，并确认该管理员仍存在于数据库中。

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{CurrentAdmin, JwtError};
use crate::core::ServerState;
use crate::db::repository::admin;
use crate::security_log;
use crate::utils::{AppError, ErrorCode};

impl FromRequestParts<ServerState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted
        if let Some(admin) = parts.extensions.get::<CurrentAdmin>() {
            return Ok(admin.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => crate::auth::JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::not_authenticated());
            }
        };

        let current = authenticate_token(state, token).await.inspect_err(|e| {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.message.clone(),
                uri = format!("{:?}", parts.uri)
            );
        })?;

        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// 校验令牌并复核管理员账号
///
/// WebSocket 订阅通过 `?token=` 传递令牌，也走这里。
pub async fn authenticate_token(state: &ServerState, token: &str) -> Result<CurrentAdmin, AppError> {
    let claims = state.jwt_service.validate_token(token).map_err(|e| match e {
        JwtError::ExpiredToken => AppError::token_expired(),
        _ => AppError::invalid_token("Invalid token"),
    })?;

    let current = CurrentAdmin::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {e}")))?;

    // 令牌有效但账号已被删除 → 会话失效
    let exists = admin::find_by_id(&state.pool, current.id).await?;
    match exists {
        Some(row) if row.username == current.username => Ok(current),
        _ => Err(AppError::new(ErrorCode::SessionExpired)),
    }
}
