//! 实时变更消息类型定义
//!
//! 这些类型在 queue-server 和浏览器视图之间共享：
//! 服务端写库成功后发布 [`ChangeEvent`]，视图据此重新拉取或增量更新。
//!
//! ```text
//! handler ──write──▶ SQLite
//!    │
//!    └─publish──▶ ChangeHub ──▶ SyncedView (re-fetch / upsert)
//!                          └──▶ /api/realtime/{table} (WebSocket)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 可订阅的数据表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Events,
    Reservations,
    Payments,
    Visitors,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Events,
        Table::Reservations,
        Table::Payments,
        Table::Visitors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Reservations => "reservations",
            Self::Payments => "payments",
            Self::Visitors => "visitors",
        }
    }

    /// 公开表无需管理员令牌即可订阅
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Events | Self::Visitors)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "events" => Ok(Self::Events),
            "reservations" => Ok(Self::Reservations),
            "payments" => Ok(Self::Payments),
            "visitors" => Ok(Self::Visitors),
            other => Err(format!("unknown table: {other}")),
        }
    }
}

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// 单条变更通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub action: ChangeAction,
    /// 行 ID
    pub id: i64,
    /// 该表的版本号（每次发布递增）
    pub version: u64,
    /// 变更后的行数据 (deleted 时为 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// WebSocket 下发帧
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RealtimeFrame {
    /// 订阅建立
    Ready { table: Table },
    /// 数据变更
    Change(ChangeEvent),
    /// 客户端落后太多，需要全量重新拉取
    Resync { table: Table },
}
