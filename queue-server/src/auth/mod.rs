//! 认证模块
//!
//! - [`JwtService`] - 管理员会话令牌
//! - [`CurrentAdmin`] - 当前管理员上下文 (axum extractor)
//! - [`password`] - Argon2 密码哈希

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::authenticate_token;
pub use jwt::{Claims, CurrentAdmin, IssuedToken, JwtConfig, JwtError, JwtService};
pub use password::{hash_password, verify_password};
