//! Voucher Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type VoucherId = RecordId;

/// Voucher task
///
/// `slots` is the remaining acceptance capacity. It is only ever decremented
/// through the repository's atomic conditional claim and never goes negative.
/// `accepted_by` is the append-only history of users who claimed a slot.
/// Per-user progress lives in the `enrollment` table, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    pub id: Option<VoucherId>,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    /// Points awarded to the user on admin approval
    pub points: i64,
    pub slots: i64,
    /// Administrative status of the voucher itself; not authoritative for
    /// any user's progress
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub accepted_by: Vec<RecordId>,
    pub created_at: i64,
}

fn default_status() -> String {
    "pending".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherCreate {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub points: i64,
    pub slots: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoucherUpdate {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub points: Option<i64>,
    pub slots: Option<i64>,
}
