//! JWT 令牌服务
//!
//! 处理管理员会话令牌的生成、验证和解析。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::ConfigError;

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl JwtConfig {
    /// 从环境变量加载
    ///
    /// debug 构建下缺少 `JWT_SECRET` 时生成临时密钥 (重启后旧令牌失效)，
    /// release 构建下缺少则报错。
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if secret.len() < 32 => {
                return Err(ConfigError::Invalid {
                    name: "JWT_SECRET",
                    reason: "must be at least 32 characters long".into(),
                });
            }
            Ok(secret) => secret,
            Err(_) => {
                #[cfg(debug_assertions)]
                {
                    tracing::warn!("JWT_SECRET not set! Generating temporary key for development.");
                    generate_printable_secret()
                }
                #[cfg(not(debug_assertions))]
                {
                    return Err(ConfigError::Missing("JWT_SECRET"));
                }
            }
        };

        Ok(Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(480), // 默认 8 小时
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "queue-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "queue-admin".to_string()),
        })
    }
}

/// 生成可打印的随机密钥 (开发环境)
pub fn generate_printable_secret() -> String {
    const CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";
    let mut rng = rand::thread_rng();
    (0..64)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 管理员 ID (Subject)
    pub sub: String,
    /// 用户名
    pub username: String,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("无效签名")]
    InvalidSignature,

    #[error("令牌生成失败: {0}")]
    GenerationFailed(String),
}

/// 已签发的令牌
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// 过期时间 (Unix 秒)
    pub expires_at: i64,
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// 使用指定配置创建 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为管理员生成新令牌
    pub fn generate_token(&self, admin_id: i64, username: &str) -> Result<IssuedToken, JwtError> {
        self.generate_token_with_ttl(admin_id, username, Duration::minutes(self.config.expiration_minutes))
    }

    fn generate_token_with_ttl(
        &self,
        admin_id: i64,
        username: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let expiration = now + ttl;

        let claims = Claims {
            sub: admin_id.to_string(),
            username: username.to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// 当前管理员上下文 (从 JWT Claims 解析，并经数据库复核)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentAdmin {
    pub id: i64,
    pub username: String,
}

impl TryFrom<Claims> for CurrentAdmin {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| JwtError::InvalidToken(format!("bad subject: {}", claims.sub)))?;
        Ok(Self {
            id,
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "unit-test-secret-that-is-long-enough-42".into(),
            expiration_minutes: 30,
            issuer: "queue-server".into(),
            audience: "queue-admin".into(),
        })
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = service();
        let issued = service.generate_token(7, "admin").unwrap();
        let claims = service.validate_token(&issued.token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.exp, issued.expires_at);

        let admin = CurrentAdmin::try_from(claims).unwrap();
        assert_eq!(admin, CurrentAdmin { id: 7, username: "admin".into() });
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = service();
        let issued = service
            .generate_token_with_ttl(1, "admin", Duration::seconds(-120))
            .unwrap();
        assert!(matches!(
            service.validate_token(&issued.token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let issued = service().generate_token(1, "admin").unwrap();
        let other = JwtService::with_config(JwtConfig {
            secret: "another-secret-that-is-also-long-enough!".into(),
            ..service().config
        });
        assert!(matches!(
            other.validate_token(&issued.token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            service().validate_token("not.a.token"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }

    #[test]
    fn test_printable_secret() {
        let secret = generate_printable_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_graphic()));
    }
}
