//! ChangeHub - 按表广播的变更通知
//!
//! 每张表一个 `broadcast` 通道。写库成功后由 handler 调用
//! [`ChangeHub::publish`]，订阅方 (SyncedView、WebSocket 会话) 各自持有 receiver。

use dashmap::DashMap;
use serde::Serialize;
use shared::message::{ChangeAction, ChangeEvent, Table};
use std::sync::Arc;
use tokio::sync::broadcast;

/// 每个表通道的缓冲容量
pub const CHANNEL_CAPACITY: usize = 256;

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理，每张表独立递增。
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<Table, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 递增指定表的版本号并返回新值 (从 1 开始)
    pub fn increment(&self, table: Table) -> u64 {
        let mut entry = self.versions.entry(table).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取当前版本号，未发布过时为 0
    pub fn get(&self, table: Table) -> u64 {
        self.versions.get(&table).map(|v| *v).unwrap_or(0)
    }
}

#[derive(Debug)]
struct HubInner {
    senders: [broadcast::Sender<ChangeEvent>; 4],
    versions: ResourceVersions,
}

/// 变更通知中心 (Arc 共享，clone 成本极低)
#[derive(Debug, Clone)]
pub struct ChangeHub {
    inner: Arc<HubInner>,
}

fn slot(table: Table) -> usize {
    match table {
        Table::Events => 0,
        Table::Reservations => 1,
        Table::Payments => 2,
        Table::Visitors => 3,
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                senders: std::array::from_fn(|_| broadcast::channel(CHANNEL_CAPACITY).0),
                versions: ResourceVersions::new(),
            }),
        }
    }

    /// 发布一条变更
    ///
    /// 版本号在发送前递增；没有订阅者时不算错误。
    pub fn publish<T: Serialize>(
        &self,
        table: Table,
        action: ChangeAction,
        id: i64,
        data: Option<&T>,
    ) -> ChangeEvent {
        let version = self.inner.versions.increment(table);
        let event = ChangeEvent {
            table,
            action,
            id,
            version,
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };

        let receivers = self.inner.senders[slot(table)]
            .send(event.clone())
            .unwrap_or(0);
        tracing::debug!(
            table = %table,
            action = %action,
            id,
            version,
            receivers,
            "Change published"
        );
        event
    }

    /// 订阅一张表的全部变更
    pub fn subscribe(&self, table: Table) -> Subscription {
        Subscription {
            table,
            rx: self.inner.senders[slot(table)].subscribe(),
        }
    }

    /// 当前版本号
    pub fn version(&self, table: Table) -> u64 {
        self.inner.versions.get(table)
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self, table: Table) -> usize {
        self.inner.senders[slot(table)].receiver_count()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

/// 单表订阅 (命名通道)
#[derive(Debug)]
pub struct Subscription {
    table: Table,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn table(&self) -> Table {
        self.table
    }

    pub async fn recv(&mut self) -> Result<ChangeEvent, broadcast::error::RecvError> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_table_subscribers_only() {
        let hub = ChangeHub::new();
        let mut events = hub.subscribe(Table::Events);
        let mut reservations = hub.subscribe(Table::Reservations);

        hub.publish(Table::Reservations, ChangeAction::Created, 1, Some(&serde_json::json!({"id": 1})));

        let got = reservations.recv().await.unwrap();
        assert_eq!(got.table, Table::Reservations);
        assert_eq!(got.action, ChangeAction::Created);
        assert_eq!(got.version, 1);
        assert!(events.rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = ChangeHub::new();
        let event = hub.publish::<()>(Table::Payments, ChangeAction::Deleted, 3, None);
        assert_eq!(event.version, 1);
        assert!(event.data.is_none());
        assert_eq!(hub.version(Table::Payments), 1);
        assert_eq!(hub.version(Table::Events), 0);
    }

    #[test]
    fn test_versions_are_per_table() {
        let versions = ResourceVersions::new();
        assert_eq!(versions.increment(Table::Events), 1);
        assert_eq!(versions.increment(Table::Events), 2);
        assert_eq!(versions.increment(Table::Visitors), 1);
        assert_eq!(versions.get(Table::Events), 2);
        assert_eq!(versions.get(Table::Reservations), 0);
    }

    #[test]
    fn test_subscriber_count() {
        let hub = ChangeHub::new();
        let sub = hub.subscribe(Table::Visitors);
        assert_eq!(sub.table(), Table::Visitors);
        assert_eq!(hub.subscriber_count(Table::Visitors), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(Table::Visitors), 0);
    }
}
