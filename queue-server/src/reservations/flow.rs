//! 预约流程 - 分配排队号并写入预约
//!
//! # 排队号分配
//!
//! ```text
//! 校验 (不访问存储) ─▶ 活动存在? ─▶ max + 1 ─▶ INSERT
//!                                     ▲           │ UNIQUE(event_id, queue_number) 冲突
//!                                     └── 重读 max, 且不小于 candidate + 1
//! ```
//!
//! 唯一索引保证同一活动内排队号不重复；冲突说明其他请求先拿到了该号，
//! 重试最多 [`MAX_BOOKING_ATTEMPTS`] 次。

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Reservation, ReservationCreate};
use std::sync::Arc;

use super::store::{NewReservation, QueueStore};
use crate::db::repository::RepoError;

/// 单次预约的最大写入尝试次数
pub const MAX_BOOKING_ATTEMPTS: usize = 16;

/// 预约流程
#[derive(Clone)]
pub struct ReservationFlow {
    store: Arc<dyn QueueStore>,
}

impl std::fmt::Debug for ReservationFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationFlow").finish_non_exhaustive()
    }
}

impl ReservationFlow {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self { store }
    }

    /// 为访客创建一条待支付预约
    pub async fn book(&self, request: ReservationCreate) -> AppResult<Reservation> {
        let event_id = request
            .event_id
            .ok_or_else(|| AppError::new(ErrorCode::EventNotSelected).with_detail("field", "event_id"))?;

        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::new(ErrorCode::NameRequired).with_detail("field", "name"));
        }
        let surname = request
            .surname
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if !self.store.event_exists(event_id).await? {
            return Err(event_not_found(event_id));
        }

        let mut candidate = next_number(self.store.max_queue_number(event_id).await?);

        for attempt in 1..=MAX_BOOKING_ATTEMPTS {
            let new = NewReservation {
                event_id,
                name: name.to_string(),
                surname: surname.clone(),
                queue_number: candidate,
            };

            match self.store.insert_reservation(new).await {
                Ok(reservation) => {
                    tracing::info!(
                        reservation_id = reservation.id,
                        event_id,
                        queue_number = reservation.queue_number,
                        attempt,
                        "Reservation booked"
                    );
                    return Ok(reservation);
                }
                Err(RepoError::Duplicate(_)) => {
                    tracing::debug!(event_id, candidate, attempt, "Queue number taken, retrying");
                    let latest = next_number(self.store.max_queue_number(event_id).await?);
                    candidate = latest.max(candidate + 1);
                }
                // 活动在校验之后被删除 (外键失败)
                Err(RepoError::NotFound(_)) => return Err(event_not_found(event_id)),
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(event_id, attempts = MAX_BOOKING_ATTEMPTS, "Queue number allocation exhausted");
        Err(AppError::new(ErrorCode::QueueNumberConflict).with_detail("event_id", event_id))
    }
}

fn next_number(max: Option<i64>) -> i64 {
    max.map_or(1, |m| m + 1)
}

fn event_not_found(event_id: i64) -> AppError {
    AppError::new(ErrorCode::EventNotFound).with_detail("event_id", event_id)
}
