//! Repository Module
//!
//! CRUD and the handful of atomic conditional updates the engines rely on,
//! one repository per SurrealDB table.

pub mod enrollment;
pub mod product;
pub mod revoked_token;
pub mod transaction;
pub mod user;
pub mod voucher;

// Re-exports
pub use enrollment::EnrollmentRepository;
pub use product::ProductRepository;
pub use revoked_token::RevokedTokenRepository;
pub use transaction::TransactionRepository;
pub use user::UserRepository;
pub use voucher::VoucherRepository;

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;
use thiserror::Error;

use crate::utils::AppError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        if msg.contains("already exists") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: "table:key" strings at the API boundary
// =============================================================================
//
// All record ids use surrealdb::RecordId. API callers may send either the
// bare key or the full "table:key" form; `record_id` normalizes both.

/// Build a [`RecordId`], accepting either "key" or "table:key" input
pub fn record_id(table: &str, id: &str) -> RecordId {
    let key = id
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(id);
    RecordId::from_table_key(table, key)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_accepts_both_forms() {
        let bare = record_id("user", "abc123");
        let prefixed = record_id("user", "user:abc123");
        assert_eq!(bare, prefixed);
        assert_eq!(bare.table(), "user");
        assert_eq!(bare.key().to_string(), "abc123");
    }
}
