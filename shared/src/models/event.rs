//! Event Model

use serde::{Deserialize, Serialize};

/// Event entity (活动：名称、时间、海报)
///
/// All timestamps are Unix millis (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_time: i64,
    pub end_time: i64,
    /// Public URL of the poster image
    pub poster_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create event payload
///
/// Times arrive as text from the admin form and are parsed with
/// [`crate::util::parse_timestamp`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventCreate {
    pub name: String,
    pub description: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

/// Update event payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}
