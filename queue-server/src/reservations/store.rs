//! 预约存储接口
//!
//! [`ReservationFlow`](super::ReservationFlow) 只通过 [`QueueStore`] 访问存储，
//! 生产环境使用 [`SqliteQueueStore`]。

use async_trait::async_trait;
use shared::models::Reservation;
use sqlx::SqlitePool;

use crate::db::repository::{RepoResult, event, reservation};

/// 待写入的预约 (状态固定为 pending)
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub event_id: i64,
    pub name: String,
    pub surname: Option<String>,
    pub queue_number: i64,
}

/// 排队号分配所需的存储操作
///
/// `insert_reservation` 在 `(event_id, queue_number)` 冲突时必须返回
/// [`RepoError::Duplicate`](crate::db::repository::RepoError::Duplicate)。
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn event_exists(&self, event_id: i64) -> RepoResult<bool>;

    /// 当前最大排队号，没有预约时为 `None`
    async fn max_queue_number(&self, event_id: i64) -> RepoResult<Option<i64>>;

    async fn insert_reservation(&self, new: NewReservation) -> RepoResult<Reservation>;
}

/// SQLite 实现
#[derive(Debug, Clone)]
pub struct SqliteQueueStore {
    pool: SqlitePool,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn event_exists(&self, event_id: i64) -> RepoResult<bool> {
        event::exists(&self.pool, event_id).await
    }

    async fn max_queue_number(&self, event_id: i64) -> RepoResult<Option<i64>> {
        reservation::max_queue_number(&self.pool, event_id).await
    }

    async fn insert_reservation(&self, new: NewReservation) -> RepoResult<Reservation> {
        reservation::insert(
            &self.pool,
            new.event_id,
            &new.name,
            new.surname.as_deref(),
            new.queue_number,
        )
        .await
    }
}
