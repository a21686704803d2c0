//! Enrollment Repository
//!
//! Enrollments use the composite key `<voucher_key>_<user_key>` as their
//! record id, so "at most one enrollment per (user, voucher) pair" holds at
//! the storage layer rather than by caller convention. Status transitions are
//! compare-and-set: the UPDATE carries the expected current status, and a
//! no-op result means the record was missing or in another state.

use serde::Deserialize;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Enrollment, EnrollmentFull, EnrollmentStatus, Voucher};
use crate::utils::now_millis;

const ENROLLMENT_TABLE: &str = "enrollment";

/// Composite record key for a (voucher, user) pair
fn enrollment_key(voucher: &RecordId, user: &RecordId) -> String {
    format!("{}_{}", voucher.key(), user.key())
}

/// Row shape when the voucher link is FETCHed into the full record
#[derive(Debug, Deserialize)]
struct EnrollmentWithVoucher {
    id: RecordId,
    voucher: Voucher,
    status: EnrollmentStatus,
    created_at: i64,
    updated_at: i64,
}

#[derive(Clone)]
pub struct EnrollmentRepository {
    base: BaseRepository,
}

impl EnrollmentRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find(
        &self,
        voucher: &RecordId,
        user: &RecordId,
    ) -> RepoResult<Option<Enrollment>> {
        let enrollment: Option<Enrollment> = self
            .base
            .db()
            .select((ENROLLMENT_TABLE, enrollment_key(voucher, user)))
            .await?;
        Ok(enrollment)
    }

    /// Insert the `pending` enrollment for a fresh accept
    ///
    /// Fails with `Duplicate` if the pair already has an enrollment; the
    /// composite key makes this safe against concurrent accepts.
    pub async fn create_pending(
        &self,
        voucher: RecordId,
        user: RecordId,
    ) -> RepoResult<Enrollment> {
        let now = now_millis();
        let key = enrollment_key(&voucher, &user);
        let enrollment = Enrollment {
            id: None,
            voucher,
            user,
            status: EnrollmentStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let created: Option<Enrollment> = self
            .base
            .db()
            .create((ENROLLMENT_TABLE, key))
            .content(enrollment)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create enrollment".to_string()))
    }

    /// Compare-and-set status transition
    ///
    /// Applies `expected -> next` and returns the updated record, or `None`
    /// when the enrollment is missing or not in `expected`.
    pub async fn transition(
        &self,
        voucher: &RecordId,
        user: &RecordId,
        expected: EnrollmentStatus,
        next: EnrollmentStatus,
    ) -> RepoResult<Option<Enrollment>> {
        let thing = RecordId::from_table_key(ENROLLMENT_TABLE, enrollment_key(voucher, user));
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET status = $next, updated_at = $now \
                 WHERE status = $expected RETURN AFTER",
            )
            .bind(("thing", thing))
            .bind(("next", next))
            .bind(("expected", expected))
            .bind(("now", now_millis()))
            .await?;
        let rows: Vec<Enrollment> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// All enrollments of one user, with the voucher record resolved
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<EnrollmentFull>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM enrollment WHERE user = $user ORDER BY created_at FETCH voucher")
            .bind(("user", user.clone()))
            .await?;
        let rows: Vec<EnrollmentWithVoucher> = result.take(0)?;
        Ok(rows
            .into_iter()
            .map(|row| EnrollmentFull {
                id: row.id.to_string(),
                voucher: row.voucher,
                status: row.status,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    /// All enrollments referencing one voucher
    pub async fn find_by_voucher(&self, voucher: &RecordId) -> RepoResult<Vec<Enrollment>> {
        let rows: Vec<Enrollment> = self
            .base
            .db()
            .query("SELECT * FROM enrollment WHERE voucher = $voucher")
            .bind(("voucher", voucher.clone()))
            .await?
            .take(0)?;
        Ok(rows)
    }

    /// Remove every enrollment referencing `voucher`
    ///
    /// Idempotent: re-running after a partial failure deletes whatever is
    /// left and succeeds on an empty set.
    pub async fn delete_by_voucher(&self, voucher: &RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE enrollment WHERE voucher = $voucher")
            .bind(("voucher", voucher.clone()))
            .await?
            .check()?;
        Ok(())
    }
}
