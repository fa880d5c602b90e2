//! 实时同步
//!
//! - [`ChangeHub`]: 写库后按表广播变更
//! - [`SyncedView`]: 订阅变更并维护一份本地副本
//! - [`EventCatalogSource`]: 服务端自用的活动目录

pub mod catalog;
pub mod hub;
pub mod view;

pub use catalog::{EventCatalog, EventCatalogSource};
pub use hub::{CHANNEL_CAPACITY, ChangeHub, ResourceVersions, Subscription};
pub use view::{SyncMode, SyncedView, ViewSource};
