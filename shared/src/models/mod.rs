//! Data models
//!
//! Shared between queue-server and the browser views (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod admin;
pub mod event;
pub mod payment;
pub mod reservation;
pub mod visitor;

// Re-exports
pub use admin::*;
pub use event::*;
pub use payment::*;
pub use reservation::*;
pub use visitor::*;
