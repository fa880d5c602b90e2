//! Payment Model

use serde::{Deserialize, Serialize};

use super::PaymentStatus;

/// Payment record written when a reservation is paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub reservation_id: i64,
    pub amount: f64,
    pub payment_status: PaymentStatus,
    pub payment_date: i64,
}

/// Pay request. `amount` falls back to the configured booking price.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub amount: Option<f64>,
}

/// Result of a completed payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub reservation: super::Reservation,
}
