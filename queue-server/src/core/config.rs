use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 服务器配置 - 排队预约服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、海报、日志) |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | PUBLIC_BASE_URL | http://localhost:{HTTP_PORT} | 海报公开 URL 前缀 |
/// | SLIP_API_URL | https://api.easyslip.com/api/v1/slips | 转账凭证验证接口 |
/// | SLIP_API_TOKEN | (开发环境可为空) | 验证接口 Bearer 凭证 |
/// | SLIP_COMPANY_ID | 20 | 验证载荷中的 company_id |
/// | BOOKING_PRICE | 100 | 默认支付金额 |
/// | ADMIN_USERNAME / ADMIN_PASSWORD | - | 管理员表为空时写入的初始账号 |
/// | CORS_ALLOWED_ORIGINS | - | 逗号分隔，为空时允许任意来源 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志文件目录 (按天滚动) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/srv/queue HTTP_PORT=8080 cargo run -p queue-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、海报和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 公开访问地址 (用于生成海报 URL)
    pub public_base_url: String,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 转账凭证验证中转配置
    pub slip: SlipConfig,
    /// 默认支付金额
    pub booking_price: f64,
    /// 初始管理员 (username, password)
    pub bootstrap_admin: Option<(String, String)>,
    /// 允许的 CORS 来源 (空 = 任意)
    pub cors_allowed_origins: Vec<String>,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
}

/// 转账凭证验证中转配置
#[derive(Debug, Clone)]
pub struct SlipConfig {
    /// 上游接口地址
    pub api_url: String,
    /// 上游 Bearer 凭证，只存在于服务端
    pub api_token: String,
    /// 载荷中的 company_id
    pub company_id: String,
    /// 请求超时 (毫秒)
    pub timeout_ms: u64,
}

pub const DEFAULT_SLIP_API_URL: &str = "https://api.easyslip.com/api/v1/slips";

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值。
    /// 非开发环境下缺少 `SLIP_API_TOKEN` 时返回错误。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_port = env_parse("HTTP_PORT", 5000);
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let api_token = match std::env::var("SLIP_API_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ if environment == "development" => {
                tracing::warn!("SLIP_API_TOKEN not set, slip verification will be rejected upstream");
                String::new()
            }
            _ => return Err(ConfigError::Missing("SLIP_API_TOKEN")),
        };

        let bootstrap_admin = match (
            std::env::var("ADMIN_USERNAME").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        };

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{http_port}")),
            jwt: JwtConfig::from_env()?,
            slip: SlipConfig {
                api_url: std::env::var("SLIP_API_URL")
                    .unwrap_or_else(|_| DEFAULT_SLIP_API_URL.into()),
                api_token,
                company_id: std::env::var("SLIP_COMPANY_ID").unwrap_or_else(|_| "20".into()),
                timeout_ms: env_parse("SLIP_TIMEOUT_MS", 15_000),
            },
            booking_price: env_parse("BOOKING_PRICE", 100.0),
            bootstrap_admin,
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment,
        })
    }

    /// 测试用配置：独立工作目录，固定 JWT 密钥，不依赖环境变量
    pub fn for_tests(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port: 0,
            environment: "development".into(),
            public_base_url: "http://localhost:5000".into(),
            jwt: JwtConfig {
                secret: "test-secret-key-that-is-long-enough-0123456789".into(),
                expiration_minutes: 60,
                issuer: "queue-server".into(),
                audience: "queue-admin".into(),
            },
            slip: SlipConfig {
                api_url: "http://127.0.0.1:9/slips".into(),
                api_token: "test-token".into(),
                company_id: "20".into(),
                timeout_ms: 2_000,
            },
            booking_price: 100.0,
            bootstrap_admin: None,
            cors_allowed_origins: Vec::new(),
            log_level: "debug".into(),
            log_dir: None,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 海报目录: work_dir/uploads/event-posters/posters
    pub fn posters_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
            .join("uploads")
            .join("event-posters")
            .join("posters")
    }

    /// 日志目录: LOG_DIR 或 work_dir/logs
    pub fn logs_dir(&self) -> PathBuf {
        self.log_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&self.work_dir).join("logs"))
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.posters_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
