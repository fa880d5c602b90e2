//! 活动目录视图
//!
//! 服务端持有一份与 `events` 表同步的副本，`GET /api/events` 直接读取它。

use async_trait::async_trait;
use shared::message::Table;
use shared::models::Event;
use sqlx::SqlitePool;

use super::view::ViewSource;
use crate::db::repository::event;

/// `events` 表的数据来源
#[derive(Debug, Clone)]
pub struct EventCatalogSource {
    pool: SqlitePool,
}

impl EventCatalogSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ViewSource for EventCatalogSource {
    type Row = Event;

    fn table(&self) -> Table {
        Table::Events
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Event>> {
        Ok(event::find_all(&self.pool).await?)
    }

    async fn fetch_one(&self, id: i64) -> anyhow::Result<Option<Event>> {
        Ok(event::find_by_id(&self.pool, id).await?)
    }

    fn row_id(row: &Event) -> i64 {
        row.id
    }

    /// 与 `find_all` 相同的顺序
    fn sort(rows: &mut [Event]) {
        rows.sort_by_key(|e| (e.start_time, e.id));
    }
}

/// 活动目录 (增量同步)
pub type EventCatalog = super::view::SyncedView<EventCatalogSource>;
