//! Enrollment Model
//!
//! The single record of truth for one user's progress on one voucher.
//! The record id is the composite key `<voucher_key>_<user_key>`, so the
//! database itself guarantees at most one enrollment per pair.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::Voucher;

/// Per-user voucher progress
///
/// ```text
/// (none) --accept--> pending --complete--> approval --review(completed)--> completed
///                                                  \--review(cancelled)--> cancelled
/// ```
///
/// `completed` and `cancelled` are terminal; no operation leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Accepted, not yet marked done by the user
    Pending,
    /// User marked done, awaiting admin review
    Approval,
    /// Admin approved; points were awarded
    Completed,
    /// Admin rejected; no points
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approval => "approval",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrollmentStatus::Completed | EnrollmentStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Option<RecordId>,
    /// Record link to the voucher
    pub voucher: RecordId,
    /// Record link to the user
    pub user: RecordId,
    pub status: EnrollmentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Enrollment with the voucher record resolved, for "my vouchers" listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentFull {
    pub id: String,
    pub voucher: Voucher,
    pub status: EnrollmentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EnrollmentStatus::Approval).unwrap(),
            "\"approval\""
        );
        assert_eq!(
            serde_json::from_str::<EnrollmentStatus>("\"cancelled\"").unwrap(),
            EnrollmentStatus::Cancelled
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!EnrollmentStatus::Pending.is_terminal());
        assert!(!EnrollmentStatus::Approval.is_terminal());
        assert!(EnrollmentStatus::Completed.is_terminal());
        assert!(EnrollmentStatus::Cancelled.is_terminal());
    }
}
