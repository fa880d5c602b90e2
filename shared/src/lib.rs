//! Shared types for the queue reservation service
//!
//! Domain models, realtime change messages, the unified error system and
//! small utilities used by queue-server and its browser views.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

// Realtime re-exports
pub use message::{ChangeAction, ChangeEvent, RealtimeFrame, Table};
