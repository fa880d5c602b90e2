//! SyncedView - 本地副本与数据库保持同步
//!
//! ```text
//! mount ──subscribe──▶ ChangeHub
//!   │
//!   ├─ initial fetch ──▶ rows
//!   └─ spawn listener ──┬─ change (Refetch)      ──▶ full fetch ──▶ rows
//!                       ├─ change (Incremental)  ──▶ fetch_one(id) ──▶ upsert/remove
//!                       ├─ lagged               ──▶ full fetch
//!                       └─ cancelled (unmount)  ──▶ exit, no more fetches
//! ```
//!
//! 增量模式按 id 重新读取该行，不信任通知里携带的数据：
//! 通知的到达顺序可能与提交顺序不同，存储中的当前值才是准的。
//!
//! 拉取失败只记录日志，保留上一份副本，并标记为未同步；
//! 未同步时下一条变更 (或 [`SyncedView::refresh`]) 触发全量拉取。

use async_trait::async_trait;
use shared::message::{ChangeEvent, Table};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::hub::{ChangeHub, Subscription};

/// 视图的数据来源
#[async_trait]
pub trait ViewSource: Send + Sync + 'static {
    type Row: Clone + Send + Sync + 'static;

    /// 订阅的表
    fn table(&self) -> Table;

    /// 全量读取
    async fn fetch(&self) -> anyhow::Result<Vec<Self::Row>>;

    /// 按 id 读取单行，不存在时为 `None`
    ///
    /// 默认实现走全量读取；数据源有主键查询时应覆盖。
    async fn fetch_one(&self, id: i64) -> anyhow::Result<Option<Self::Row>> {
        Ok(self
            .fetch()
            .await?
            .into_iter()
            .find(|row| Self::row_id(row) == id))
    }

    /// 行 ID，增量模式下用于定位
    fn row_id(row: &Self::Row) -> i64;

    /// 增量更新后的排序，默认保持插入顺序
    fn sort(_rows: &mut [Self::Row]) {}
}

/// 收到变更后的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// 丢弃本地副本，重新全量拉取
    #[default]
    Refetch,
    /// 只重新读取变更的那一行，未同步时回退到全量拉取
    Incremental,
}

struct ViewShared<S: ViewSource> {
    source: S,
    hub: ChangeHub,
    mode: SyncMode,
    rows: RwLock<Vec<S::Row>>,
    fetches: AtomicU64,
    /// 最近一次读取是否成功 (副本可用)
    in_sync: AtomicBool,
    /// 串行化读取与写回，较早的读取结果不会覆盖较新的
    sync: Mutex<()>,
    /// 已反映到本地副本的最高版本号
    applied: watch::Sender<u64>,
    cancel: CancellationToken,
}

impl<S: ViewSource> ViewShared<S> {
    /// 全量拉取；成功后把已应用版本推进到 `version`
    async fn refetch(&self, version: u64) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _guard = self.sync.lock().await;
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let result = tokio::select! {
            _ = self.cancel.cancelled() => return,
            result = self.source.fetch() => result,
        };

        match result {
            Ok(rows) => {
                *self.rows.write().await = rows;
                self.in_sync.store(true, Ordering::Release);
                self.advance(version);
            }
            Err(e) => {
                self.in_sync.store(false, Ordering::Release);
                tracing::warn!(
                    table = %self.source.table(),
                    error = %e,
                    "View fetch failed, keeping previous rows"
                );
            }
        }
    }

    async fn apply(&self, change: ChangeEvent) {
        if self.mode == SyncMode::Refetch || !self.in_sync.load(Ordering::Acquire) {
            self.refetch(change.version).await;
            return;
        }

        let _guard = self.sync.lock().await;
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return,
            result = self.source.fetch_one(change.id) => result,
        };

        let current = match result {
            Ok(current) => current,
            Err(e) => {
                self.in_sync.store(false, Ordering::Release);
                tracing::warn!(
                    table = %change.table,
                    id = change.id,
                    error = %e,
                    "View row lookup failed, keeping previous rows"
                );
                return;
            }
        };

        let mut rows = self.rows.write().await;
        match current {
            Some(row) => match rows.iter_mut().find(|r| S::row_id(r) == change.id) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            },
            None => rows.retain(|r| S::row_id(r) != change.id),
        }
        S::sort(&mut rows);
        drop(rows);
        self.advance(change.version);
    }

    fn advance(&self, version: u64) {
        self.applied.send_if_modified(|current| {
            if version > *current {
                *current = version;
                true
            } else {
                false
            }
        });
    }
}

/// 与某张表保持同步的本地视图
///
/// Drop 或 [`SyncedView::unmount`] 后不再发起任何拉取。
pub struct SyncedView<S: ViewSource> {
    shared: Arc<ViewShared<S>>,
    task: Option<JoinHandle<()>>,
}

impl<S: ViewSource> SyncedView<S> {
    /// 挂载：先订阅再全量拉取，然后启动监听任务
    pub async fn mount(hub: &ChangeHub, source: S, mode: SyncMode) -> Self {
        let table = source.table();
        let subscription = hub.subscribe(table);
        let version_at_mount = hub.version(table);

        let shared = Arc::new(ViewShared {
            source,
            hub: hub.clone(),
            mode,
            rows: RwLock::new(Vec::new()),
            fetches: AtomicU64::new(0),
            in_sync: AtomicBool::new(false),
            sync: Mutex::new(()),
            applied: watch::channel(0).0,
            cancel: CancellationToken::new(),
        });

        shared.refetch(version_at_mount).await;

        let task = tokio::spawn(listen(shared.clone(), subscription));
        tracing::debug!(table = %table, ?mode, "View mounted");

        Self {
            shared,
            task: Some(task),
        }
    }

    /// 卸载：取消监听并等待任务退出
    pub async fn unmount(mut self) {
        self.shared.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "View listener ended abnormally");
        }
        tracing::debug!(table = %self.shared.source.table(), "View unmounted");
    }

    /// 立即全量拉取 (例如上次读取失败后重试)
    pub async fn refresh(&self) {
        let version = self.shared.hub.version(self.table());
        self.shared.refetch(version).await;
    }

    /// 当前本地副本
    pub async fn snapshot(&self) -> Vec<S::Row> {
        self.shared.rows.read().await.clone()
    }

    /// 已执行的全量拉取次数 (含挂载时的一次)
    pub fn fetch_count(&self) -> u64 {
        self.shared.fetches.load(Ordering::Relaxed)
    }

    /// 已反映到本地副本的最高版本号
    pub fn applied_version(&self) -> u64 {
        *self.shared.applied.borrow()
    }

    /// 最近一次读取成功，副本可以对外提供
    pub fn is_in_sync(&self) -> bool {
        self.shared.in_sync.load(Ordering::Acquire)
    }

    pub fn table(&self) -> Table {
        self.shared.source.table()
    }

    /// 等待本地副本追上 `version`，超时返回 false
    pub async fn wait_for_version(&self, version: u64, timeout: Duration) -> bool {
        let mut rx = self.shared.applied.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|applied| *applied >= version))
            .await
            .is_ok_and(|r| r.is_ok())
    }

    pub fn is_mounted(&self) -> bool {
        !self.shared.cancel.is_cancelled()
    }
}

impl<S: ViewSource> std::fmt::Debug for SyncedView<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncedView")
            .field("table", &self.table())
            .field("mode", &self.shared.mode)
            .field("applied_version", &self.applied_version())
            .field("in_sync", &self.is_in_sync())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

impl<S: ViewSource> Drop for SyncedView<S> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

async fn listen<S: ViewSource>(shared: Arc<ViewShared<S>>, mut subscription: Subscription) {
    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            msg = subscription.recv() => match msg {
                Ok(change) => shared.apply(change).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        table = %subscription.table(),
                        lagged = n,
                        "View subscriber lagged, refetching"
                    );
                    let version = shared.hub.version(subscription.table());
                    shared.refetch(version).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}
