//! Reservation Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment state of a reservation / payment row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Reservation entity (排队预约)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub surname: Option<String>,
    /// Per-event queue number, 1-based
    pub queue_number: i64,
    pub payment_status: PaymentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Booking request from the event page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationCreate {
    pub event_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    pub surname: Option<String>,
}

/// Reservation joined with its event name (admin dashboard rows)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReservationDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub reservation: Reservation,
    pub event_name: String,
}

/// Paginated reservation listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationPage {
    pub items: Vec<ReservationDetail>,
    /// Exact total row count
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Data for the confirmation / QR view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfirmation {
    pub reservation_id: i64,
    pub event_id: i64,
    pub event_name: String,
    pub queue_number: i64,
    pub name: String,
    pub surname: Option<String>,
    pub payment_status: PaymentStatus,
    /// Value encoded into the QR code
    pub qr_value: String,
}

impl ReservationConfirmation {
    pub fn qr_value_for(reservation_id: i64) -> String {
        format!("reservation:{reservation_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_serde() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: PaymentStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(status, PaymentStatus::Paid);
        assert_eq!("failed".parse::<PaymentStatus>(), Ok(PaymentStatus::Failed));
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_detail_flattens_reservation() {
        let detail = ReservationDetail {
            reservation: Reservation {
                id: 5,
                event_id: 2,
                name: "Ann".into(),
                surname: None,
                queue_number: 3,
                payment_status: PaymentStatus::Pending,
                created_at: 1,
                updated_at: 1,
            },
            event_name: "Expo".into(),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["queue_number"], 3);
        assert_eq!(json["event_name"], "Expo");
    }

    #[test]
    fn test_qr_value() {
        assert_eq!(ReservationConfirmation::qr_value_for(42), "reservation:42");
    }
}
