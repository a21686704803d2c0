//! Revoked Token Model
//!
//! Logged-out JWTs land here and stay until they would have expired anyway.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokedToken {
    pub id: Option<RecordId>,
    pub token: String,
    /// Expiry of the underlying JWT (unix milliseconds); rows past this
    /// point are safe to purge
    pub expires_at: i64,
}
