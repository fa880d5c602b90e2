//! Visitor analytics models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One recorded page hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VisitorHit {
    pub id: i64,
    pub path: String,
    pub timestamp: i64,
}

/// Record a hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorHitCreate {
    pub path: String,
}

/// Time window filter used by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    All,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown time range: {other}")),
        }
    }
}

/// Hit counts for a range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorSummary {
    pub range: TimeRange,
    pub path: String,
    /// Hits on every path
    pub total: i64,
    /// Hits on `path`
    pub path_count: i64,
}

/// Bucketed series for the visitor chart
///
/// `labels`, `all` and `path_series` share the same index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorChart {
    pub range: TimeRange,
    pub path: String,
    pub labels: Vec<String>,
    pub all: Vec<i64>,
    pub path_series: Vec<i64>,
}
