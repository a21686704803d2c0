//! Voucher Repository
//!
//! Besides plain CRUD this owns the one write that must be atomic: claiming
//! a slot. `claim_slot` folds the availability check, the decrement and the
//! `accepted_by` append into a single conditional UPDATE, so two concurrent
//! accepts of the last slot cannot both succeed.

use super::{BaseRepository, RepoError, RepoResult, record_id};
use crate::db::models::{Voucher, VoucherCreate, VoucherUpdate};
use crate::utils::now_millis;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const VOUCHER_TABLE: &str = "voucher";

#[derive(Clone)]
pub struct VoucherRepository {
    base: BaseRepository,
}

impl VoucherRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Vouchers that can still be accepted
    pub async fn find_available(&self) -> RepoResult<Vec<Voucher>> {
        let vouchers: Vec<Voucher> = self
            .base
            .db()
            .query("SELECT * FROM voucher WHERE slots > 0 ORDER BY created_at")
            .await?
            .take(0)?;
        Ok(vouchers)
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Voucher>> {
        let vouchers: Vec<Voucher> = self
            .base
            .db()
            .query("SELECT * FROM voucher ORDER BY created_at")
            .await?
            .take(0)?;
        Ok(vouchers)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Voucher>> {
        let voucher: Option<Voucher> = self.base.db().select(record_id(VOUCHER_TABLE, id)).await?;
        Ok(voucher)
    }

    pub async fn create(&self, data: VoucherCreate) -> RepoResult<Voucher> {
        let voucher = Voucher {
            id: None,
            title: data.title,
            subtitle: data.subtitle,
            description: data.description,
            points: data.points,
            slots: data.slots,
            status: "pending".to_string(),
            accepted_by: Vec::new(),
            created_at: now_millis(),
        };

        let created: Option<Voucher> = self.base.db().create(VOUCHER_TABLE).content(voucher).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create voucher".to_string()))
    }

    pub async fn update(&self, id: &str, data: VoucherUpdate) -> RepoResult<Voucher> {
        let thing = record_id(VOUCHER_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.title.is_some() {
            set_parts.push("title = $title");
        }
        if data.subtitle.is_some() {
            set_parts.push("subtitle = $subtitle");
        }
        if data.description.is_some() {
            set_parts.push("description = $description");
        }
        if data.points.is_some() {
            set_parts.push("points = $points");
        }
        if data.slots.is_some() {
            set_parts.push("slots = $slots");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Voucher {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));

        if let Some(v) = data.title {
            query = query.bind(("title", v));
        }
        if let Some(v) = data.subtitle {
            query = query.bind(("subtitle", v));
        }
        if let Some(v) = data.description {
            query = query.bind(("description", v));
        }
        if let Some(v) = data.points {
            query = query.bind(("points", v));
        }
        if let Some(v) = data.slots {
            query = query.bind(("slots", v));
        }

        let vouchers: Vec<Voucher> = query.await?.take(0)?;
        vouchers
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Voucher {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let result: Option<Voucher> = self.base.db().delete(record_id(VOUCHER_TABLE, id)).await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("Voucher {} not found", id)));
        }
        Ok(())
    }

    /// Atomically claim one slot for `user`
    ///
    /// Decrements `slots` and appends to `accepted_by` only while `slots > 0`,
    /// in one conditional update. Returns the voucher after the claim, or
    /// `None` when no slot was available (the update did not apply).
    pub async fn claim_slot(&self, id: &str, user: RecordId) -> RepoResult<Option<Voucher>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET slots -= 1, accepted_by += $user \
                 WHERE slots > 0 RETURN AFTER",
            )
            .bind(("thing", record_id(VOUCHER_TABLE, id)))
            .bind(("user", user))
            .await?;
        let vouchers: Vec<Voucher> = result.take(0)?;
        Ok(vouchers.into_iter().next())
    }
}
