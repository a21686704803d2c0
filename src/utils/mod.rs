//! Utility module - shared types and helpers
//!
//! - [`AppError`] / [`AppResult`] - application error type
//! - [`AppResponse`] - API response envelope
//! - logging setup

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, AppResult};
pub use error::{ok, ok_with_message};

/// Current wall-clock time as milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
