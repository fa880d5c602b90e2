//! 预约 (Reservation Flow)
//!
//! - [`ReservationFlow::book`]: 校验 → 分配排队号 → 写入
//! - [`service`]: 查询、确认页、支付、失败标记、分页列表
//!
//! 变更通知由 API 层在成功后发布。

pub mod flow;
pub mod service;
pub mod store;

pub use flow::{MAX_BOOKING_ATTEMPTS, ReservationFlow};
pub use store::{NewReservation, QueueStore, SqliteQueueStore};
