use serde::Serialize;
use shared::message::{ChangeAction, ChangeEvent, Table};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::{JwtService, hash_password};
use crate::core::error::{Result, ServerError};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::admin;
use crate::realtime::{ChangeHub, EventCatalog, EventCatalogSource, SyncMode, SyncedView};
use crate::relay::SlipRelay;
use crate::reservations::{ReservationFlow, SqliteQueueStore};
use crate::storage::PosterStorage;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc / 连接池实现浅拷贝，clone 成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | hub | ChangeHub | 按表广播的变更通知 |
/// | jwt_service | Arc<JwtService> | 管理员会话令牌 |
/// | flow | ReservationFlow | 排队号分配 |
/// | relay | SlipRelay | 转账凭证验证中转 |
/// | posters | Arc<PosterStorage> | 海报存储 |
/// | catalog | Arc<EventCatalog> | 与 events 表同步的活动目录 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub hub: ChangeHub,
    pub jwt_service: Arc<JwtService>,
    pub flow: ReservationFlow,
    pub relay: SlipRelay,
    pub posters: Arc<PosterStorage>,
    pub catalog: Arc<EventCatalog>,
    pub started_at: Instant,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录结构
    /// 2. 打开 `work_dir/database/queue.db` 并执行迁移
    /// 3. 管理员表为空时写入初始账号
    /// 4. 挂载活动目录视图
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_dir().join("queue.db");
        let db = DbService::new(&db_path.to_string_lossy())
            .await
            .map_err(ServerError::Database)?;

        seed_admin(&db.pool, config).await?;

        Self::build(config.clone(), db).await
    }

    /// 使用已打开的数据库构造 (测试)
    pub async fn for_tests(config: Config, db: DbService) -> Result<Self> {
        Self::build(config, db).await
    }

    async fn build(config: Config, db: DbService) -> Result<Self> {
        let pool = db.pool;
        let hub = ChangeHub::new();
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let flow = ReservationFlow::new(Arc::new(SqliteQueueStore::new(pool.clone())));
        let relay = SlipRelay::new(&config.slip)?;
        let posters = Arc::new(PosterStorage::new(
            config.posters_dir(),
            &config.public_base_url,
        ));
        let catalog = Arc::new(
            SyncedView::mount(
                &hub,
                EventCatalogSource::new(pool.clone()),
                SyncMode::Incremental,
            )
            .await,
        );

        Ok(Self {
            config,
            pool,
            hub,
            jwt_service,
            flow,
            relay,
            posters,
            catalog,
            started_at: Instant::now(),
        })
    }

    /// 广播变更 (写库成功后调用)
    pub fn broadcast_sync<T: Serialize>(
        &self,
        table: Table,
        action: ChangeAction,
        id: i64,
        data: Option<&T>,
    ) -> ChangeEvent {
        self.hub.publish(table, action, id, data)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// 管理员表为空且配置了初始账号时写入
async fn seed_admin(pool: &SqlitePool, config: &Config) -> Result<()> {
    let Some((username, password)) = &config.bootstrap_admin else {
        return Ok(());
    };

    let count = admin::count(pool)
        .await
        .map_err(|e| ServerError::Database(e.into()))?;
    if count > 0 {
        return Ok(());
    }

    let hash = hash_password(password).map_err(|e| ServerError::Internal(anyhow::anyhow!(e)))?;
    let created = admin::create(pool, username, &hash)
        .await
        .map_err(|e| ServerError::Database(e.into()))?;
    tracing::info!(admin_id = created.id, username = %created.username, "Bootstrap admin created");
    Ok(())
}
