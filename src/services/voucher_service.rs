//! Voucher Lifecycle Engine
//!
//! Drives a voucher task from publication through per-user acceptance,
//! completion and admin review. Per-user progress lives in the `enrollment`
//! table; the voucher itself only carries the shared slot pool.
//!
//! The two writes that race under load go through atomic conditional
//! updates in the repositories: the slot claim on accept, and every status
//! transition. The engine itself never read-modify-writes a status.

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{
    Enrollment, EnrollmentFull, EnrollmentStatus, Voucher, VoucherCreate, VoucherUpdate,
};
use crate::db::repository::{EnrollmentRepository, UserRepository, VoucherRepository, record_id};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct VoucherService {
    vouchers: VoucherRepository,
    enrollments: EnrollmentRepository,
    users: UserRepository,
}

impl VoucherService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            vouchers: VoucherRepository::new(db.clone()),
            enrollments: EnrollmentRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }

    /// Publish a new voucher task
    pub async fn create(&self, data: VoucherCreate) -> AppResult<Voucher> {
        if data.title.trim().is_empty() {
            return Err(AppError::validation("Title must not be empty"));
        }
        if data.points <= 0 {
            return Err(AppError::validation("Points must be greater than zero"));
        }
        if data.slots <= 0 {
            return Err(AppError::validation("Slots must be greater than zero"));
        }

        let voucher = self.vouchers.create(data).await?;
        tracing::info!(
            voucher = %voucher.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            "Voucher created"
        );
        Ok(voucher)
    }

    /// Vouchers that still have open slots
    pub async fn list_available(&self) -> AppResult<Vec<Voucher>> {
        Ok(self.vouchers.find_available().await?)
    }

    /// Every voucher, including fully claimed ones (admin listing)
    pub async fn list_all(&self) -> AppResult<Vec<Voucher>> {
        Ok(self.vouchers.find_all().await?)
    }

    pub async fn get(&self, voucher_id: &str) -> AppResult<Voucher> {
        self.vouchers
            .find_by_id(voucher_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Voucher {}", voucher_id)))
    }

    /// Admin field patch
    pub async fn update(&self, voucher_id: &str, patch: VoucherUpdate) -> AppResult<Voucher> {
        if matches!(patch.points, Some(p) if p <= 0) {
            return Err(AppError::validation("Points must be greater than zero"));
        }
        if matches!(patch.slots, Some(s) if s < 0) {
            return Err(AppError::validation("Slots must not be negative"));
        }
        Ok(self.vouchers.update(voucher_id, patch).await?)
    }

    /// Accept a voucher for a user
    ///
    /// Claims a slot atomically and records the `pending` enrollment. Any
    /// existing enrollment for the pair, whatever its status, makes this a
    /// conflict; completed and cancelled are terminal.
    pub async fn accept(&self, voucher_id: &str, user_id: &str) -> AppResult<Enrollment> {
        self.vouchers
            .find_by_id(voucher_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Voucher {}", voucher_id)))?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {}", user_id)))?;

        let voucher_rid = record_id("voucher", voucher_id);
        let user_rid = record_id("user", user_id);

        if let Some(existing) = self.enrollments.find(&voucher_rid, &user_rid).await? {
            return Err(AppError::conflict(format!(
                "Voucher already accepted (status: {})",
                existing.status.as_str()
            )));
        }

        let claimed = self
            .vouchers
            .claim_slot(voucher_id, user_rid.clone())
            .await?;
        if claimed.is_none() {
            return Err(AppError::conflict("No available slots"));
        }

        match self.enrollments.create_pending(voucher_rid, user_rid).await {
            Ok(enrollment) => {
                tracing::info!(voucher = voucher_id, user = user_id, "Voucher accepted");
                Ok(enrollment)
            }
            Err(e) => {
                // Slot was claimed but the enrollment write failed; flag the
                // stranded slot for operators
                tracing::error!(
                    voucher = voucher_id,
                    user = user_id,
                    error = %e,
                    "Enrollment creation failed after slot claim, slot is stranded"
                );
                Err(e.into())
            }
        }
    }

    /// User marks the task as done; moves `pending -> approval`
    pub async fn complete(&self, voucher_id: &str, user_id: &str) -> AppResult<Enrollment> {
        let voucher_rid = record_id("voucher", voucher_id);
        let user_rid = record_id("user", user_id);

        self.enrollments
            .transition(
                &voucher_rid,
                &user_rid,
                EnrollmentStatus::Pending,
                EnrollmentStatus::Approval,
            )
            .await?
            .ok_or_else(|| AppError::invalid("Voucher is not accepted or not pending"))
    }

    /// Admin disposition of a submitted task
    ///
    /// `action` must be `completed` or `cancelled`. Approving awards the
    /// voucher's points to the user atomically. Slots are never restored on
    /// cancellation.
    pub async fn admin_review(
        &self,
        voucher_id: &str,
        user_id: &str,
        action: &str,
    ) -> AppResult<Enrollment> {
        let next = match action {
            "completed" => EnrollmentStatus::Completed,
            "cancelled" => EnrollmentStatus::Cancelled,
            other => {
                return Err(AppError::validation(format!(
                    "Action must be completed or cancelled, got {}",
                    other
                )));
            }
        };

        let voucher = self
            .vouchers
            .find_by_id(voucher_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Voucher {}", voucher_id)))?;

        let voucher_rid = record_id("voucher", voucher_id);
        let user_rid = record_id("user", user_id);

        let enrollment = self
            .enrollments
            .transition(&voucher_rid, &user_rid, EnrollmentStatus::Approval, next)
            .await?
            .ok_or_else(|| AppError::invalid("Voucher is not awaiting review"))?;

        if next == EnrollmentStatus::Completed {
            self.users.add_points(user_id, voucher.points).await?;
            tracing::info!(
                voucher = voucher_id,
                user = user_id,
                points = voucher.points,
                "Voucher approved, points awarded"
            );
        }

        Ok(enrollment)
    }

    /// All of one user's enrollments, voucher records resolved
    pub async fn user_statuses(&self, user_id: &str) -> AppResult<Vec<EnrollmentFull>> {
        let user_rid = record_id("user", user_id);
        Ok(self.enrollments.find_by_user(&user_rid).await?)
    }

    /// Delete a voucher and every enrollment referencing it
    ///
    /// Enrollments go first in one idempotent bulk delete, so a retry after
    /// a partial failure converges instead of leaving orphans.
    pub async fn delete(&self, voucher_id: &str) -> AppResult<()> {
        self.vouchers
            .find_by_id(voucher_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Voucher {}", voucher_id)))?;

        let voucher_rid = record_id("voucher", voucher_id);
        self.enrollments.delete_by_voucher(&voucher_rid).await?;
        self.vouchers.delete(voucher_id).await?;

        tracing::info!(voucher = voucher_id, "Voucher deleted with its enrollments");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::UserCreate;
    use crate::db::repository::UserRepository;

    async fn setup() -> (VoucherService, UserRepository) {
        let db = DbService::memory().await.expect("in-memory db");
        (
            VoucherService::new(db.db.clone()),
            UserRepository::new(db.db),
        )
    }

    async fn seed_user(users: &UserRepository, name: &str) -> String {
        let user = users
            .create(UserCreate {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "hash".to_string(),
                phone_number: None,
                gender: None,
                is_admin: false,
                is_active: true,
            })
            .await
            .expect("seed user");
        user.id.expect("user id").key().to_string()
    }

    async fn seed_voucher(service: &VoucherService, slots: i64, points: i64) -> String {
        let voucher = service
            .create(VoucherCreate {
                title: "Library helper".to_string(),
                subtitle: "Shelving".to_string(),
                description: "Help shelve returned books".to_string(),
                points,
                slots,
            })
            .await
            .expect("seed voucher");
        voucher.id.expect("voucher id").key().to_string()
    }

    #[tokio::test]
    async fn test_create_rejects_zero_slots_and_points() {
        let (service, _) = setup().await;

        let zero_slots = service
            .create(VoucherCreate {
                title: "t".into(),
                subtitle: "s".into(),
                description: "d".into(),
                points: 10,
                slots: 0,
            })
            .await;
        assert!(matches!(zero_slots, Err(AppError::Validation(_))));

        let zero_points = service
            .create(VoucherCreate {
                title: "t".into(),
                subtitle: "s".into(),
                description: "d".into(),
                points: 0,
                slots: 5,
            })
            .await;
        assert!(matches!(zero_points, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_accept_claims_slot_and_creates_pending_enrollment() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 3, 50).await;

        let enrollment = service.accept(&voucher_id, &user_id).await.expect("accept");
        assert_eq!(enrollment.status, EnrollmentStatus::Pending);

        let voucher = service.get(&voucher_id).await.expect("get voucher");
        assert_eq!(voucher.slots, 2);
        assert_eq!(voucher.accepted_by.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_twice_is_conflict() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 3, 50).await;

        service.accept(&voucher_id, &user_id).await.expect("accept");
        let second = service.accept(&voucher_id, &user_id).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        // The failed accept must not consume a slot
        let voucher = service.get(&voucher_id).await.expect("get voucher");
        assert_eq!(voucher.slots, 2);
    }

    #[tokio::test]
    async fn test_last_slot_goes_to_exactly_one_user() {
        let (service, users) = setup().await;
        let alice = seed_user(&users, "alice").await;
        let bob = seed_user(&users, "bob").await;
        let voucher_id = seed_voucher(&service, 1, 50).await;

        service.accept(&voucher_id, &alice).await.expect("first accept");
        let second = service.accept(&voucher_id, &bob).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let voucher = service.get(&voucher_id).await.expect("get voucher");
        assert_eq!(voucher.slots, 0);
        assert!(!voucher.slots.is_negative());
    }

    #[tokio::test]
    async fn test_full_lifecycle_awards_points_once() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 2, 75).await;

        service.accept(&voucher_id, &user_id).await.expect("accept");
        let completed = service
            .complete(&voucher_id, &user_id)
            .await
            .expect("complete");
        assert_eq!(completed.status, EnrollmentStatus::Approval);

        let reviewed = service
            .admin_review(&voucher_id, &user_id, "completed")
            .await
            .expect("review");
        assert_eq!(reviewed.status, EnrollmentStatus::Completed);

        let user = users
            .find_by_id(&user_id)
            .await
            .expect("find user")
            .expect("user exists");
        assert_eq!(user.points, 75);

        // Terminal: a second review must not pay out again
        let again = service.admin_review(&voucher_id, &user_id, "completed").await;
        assert!(matches!(again, Err(AppError::Invalid(_))));
        let user = users
            .find_by_id(&user_id)
            .await
            .expect("find user")
            .expect("user exists");
        assert_eq!(user.points, 75);
    }

    #[tokio::test]
    async fn test_cancelled_review_awards_nothing_and_keeps_slot_consumed() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 1, 75).await;

        service.accept(&voucher_id, &user_id).await.expect("accept");
        service
            .complete(&voucher_id, &user_id)
            .await
            .expect("complete");
        let reviewed = service
            .admin_review(&voucher_id, &user_id, "cancelled")
            .await
            .expect("review");
        assert_eq!(reviewed.status, EnrollmentStatus::Cancelled);

        let user = users
            .find_by_id(&user_id)
            .await
            .expect("find user")
            .expect("user exists");
        assert_eq!(user.points, 0);

        // Slots stay consumed after cancellation
        let voucher = service.get(&voucher_id).await.expect("get voucher");
        assert_eq!(voucher.slots, 0);

        // Terminal state blocks re-accepting as well
        let again = service.accept(&voucher_id, &user_id).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_complete_requires_pending() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 2, 10).await;

        // Not accepted yet
        let early = service.complete(&voucher_id, &user_id).await;
        assert!(matches!(early, Err(AppError::Invalid(_))));

        service.accept(&voucher_id, &user_id).await.expect("accept");
        service
            .complete(&voucher_id, &user_id)
            .await
            .expect("complete");

        // Already in approval
        let twice = service.complete(&voucher_id, &user_id).await;
        assert!(matches!(twice, Err(AppError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_review_rejects_unknown_action() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 2, 10).await;

        let result = service.admin_review(&voucher_id, &user_id, "maybe").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_review_requires_approval_state() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 2, 10).await;

        service.accept(&voucher_id, &user_id).await.expect("accept");

        // Still pending, not submitted for review
        let result = service
            .admin_review(&voucher_id, &user_id, "completed")
            .await;
        assert!(matches!(result, Err(AppError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_user_statuses_resolves_vouchers() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 2, 30).await;

        service.accept(&voucher_id, &user_id).await.expect("accept");

        let statuses = service.user_statuses(&user_id).await.expect("statuses");
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status, EnrollmentStatus::Pending);
        assert_eq!(statuses[0].voucher.title, "Library helper");
    }

    #[tokio::test]
    async fn test_delete_removes_voucher_and_enrollments() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 2, 30).await;

        service.accept(&voucher_id, &user_id).await.expect("accept");
        service.delete(&voucher_id).await.expect("delete");

        let missing = service.get(&voucher_id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let statuses = service.user_statuses(&user_id).await.expect("statuses");
        assert!(statuses.is_empty());
    }

    #[tokio::test]
    async fn test_accept_missing_voucher_or_user() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let voucher_id = seed_voucher(&service, 2, 30).await;

        let no_voucher = service.accept("does_not_exist", &user_id).await;
        assert!(matches!(no_voucher, Err(AppError::NotFound(_))));

        let no_user = service.accept(&voucher_id, "does_not_exist").await;
        assert!(matches!(no_user, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_available_hides_exhausted_vouchers() {
        let (service, users) = setup().await;
        let user_id = seed_user(&users, "alice").await;
        let exhausted = seed_voucher(&service, 1, 30).await;
        let _open = seed_voucher(&service, 5, 30).await;

        service.accept(&exhausted, &user_id).await.expect("accept");

        let available = service.list_available().await.expect("list");
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].slots, 5);

        let all = service.list_all().await.expect("list all");
        assert_eq!(all.len(), 2);
    }
}
