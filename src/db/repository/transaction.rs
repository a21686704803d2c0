//! Transaction Repository
//!
//! Carts and checked-out orders live in the same `store_transaction` table,
//! distinguished by status. The two lifecycle writes (checkout, disposition)
//! are compare-and-set so a transaction moves through each edge exactly once.

use serde::Deserialize;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, record_id};
use crate::db::models::{
    StoreTransaction, TransactionCreate, TransactionFull, TransactionLine, TransactionLineFull,
    TransactionStatus, TransactionUpdate,
};
use crate::utils::now_millis;

const TRANSACTION_TABLE: &str = "store_transaction";

/// Row shape when line products are FETCHed
#[derive(Debug, Deserialize)]
struct TransactionWithProducts {
    id: RecordId,
    user: RecordId,
    #[serde(default)]
    lines: Vec<TransactionLineFull>,
    status: TransactionStatus,
    created_at: i64,
}

impl From<TransactionWithProducts> for TransactionFull {
    fn from(row: TransactionWithProducts) -> Self {
        TransactionFull {
            id: row.id.to_string(),
            user: row.user,
            lines: row.lines,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct TransactionRepository {
    base: BaseRepository,
}

impl TransactionRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<TransactionFull>> {
        let rows: Vec<TransactionWithProducts> = self
            .base
            .db()
            .query("SELECT * FROM store_transaction ORDER BY created_at FETCH lines.product")
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(TransactionFull::from).collect())
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<StoreTransaction>> {
        let transaction: Option<StoreTransaction> = self
            .base
            .db()
            .select(record_id(TRANSACTION_TABLE, id))
            .await?;
        Ok(transaction)
    }

    pub async fn create(&self, data: TransactionCreate) -> RepoResult<StoreTransaction> {
        let transaction = StoreTransaction {
            id: None,
            user: data.user,
            lines: data.lines,
            status: data.status,
            created_at: now_millis(),
        };

        let created: Option<StoreTransaction> = self
            .base
            .db()
            .create(TRANSACTION_TABLE)
            .content(transaction)
            .await?;
        created.ok_or_else(|| RepoError::Database("Failed to create transaction".to_string()))
    }

    /// Free-form admin patch
    pub async fn update(&self, id: &str, data: TransactionUpdate) -> RepoResult<StoreTransaction> {
        let thing = record_id(TRANSACTION_TABLE, id);

        let mut set_parts: Vec<&str> = Vec::new();
        if data.user.is_some() {
            set_parts.push("user = $user");
        }
        if data.lines.is_some() {
            set_parts.push("lines = $lines");
        }
        if data.status.is_some() {
            set_parts.push("status = $status");
        }

        if set_parts.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Transaction {} not found", id)));
        }

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self.base.db().query(&query_str).bind(("thing", thing));

        if let Some(v) = data.user {
            query = query.bind(("user", v));
        }
        if let Some(v) = data.lines {
            query = query.bind(("lines", v));
        }
        if let Some(v) = data.status {
            query = query.bind(("status", v));
        }

        let transactions: Vec<StoreTransaction> = query.await?.take(0)?;
        transactions
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Transaction {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let result: Option<StoreTransaction> = self
            .base
            .db()
            .delete(record_id(TRANSACTION_TABLE, id))
            .await?;
        if result.is_none() {
            return Err(RepoError::NotFound(format!("Transaction {} not found", id)));
        }
        Ok(())
    }

    /// The user's open cart, if one exists
    pub async fn find_cart(&self, user: &RecordId) -> RepoResult<Option<StoreTransaction>> {
        let cart: Option<StoreTransaction> = self
            .base
            .db()
            .query(
                "SELECT * FROM store_transaction \
                 WHERE user = $user AND status = $status LIMIT 1",
            )
            .bind(("user", user.clone()))
            .bind(("status", TransactionStatus::Cart))
            .await?
            .take(0)?;
        Ok(cart)
    }

    /// All of one user's transactions, products resolved
    pub async fn find_by_user(&self, user: &RecordId) -> RepoResult<Vec<TransactionFull>> {
        let rows: Vec<TransactionWithProducts> = self
            .base
            .db()
            .query(
                "SELECT * FROM store_transaction WHERE user = $user \
                 ORDER BY created_at FETCH lines.product",
            )
            .bind(("user", user.clone()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(TransactionFull::from).collect())
    }

    /// Replace the line set of an open cart
    ///
    /// Guarded on `status = cart`; returns `None` when the record is missing
    /// or has already been checked out, so a stale rewrite can never touch a
    /// submitted order.
    pub async fn set_lines(
        &self,
        id: &str,
        lines: Vec<TransactionLine>,
    ) -> RepoResult<Option<StoreTransaction>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET lines = $lines \
                 WHERE status = $expected RETURN AFTER",
            )
            .bind(("thing", record_id(TRANSACTION_TABLE, id)))
            .bind(("lines", lines))
            .bind(("expected", TransactionStatus::Cart))
            .await?;
        let transactions: Vec<StoreTransaction> = result.take(0)?;
        Ok(transactions.into_iter().next())
    }

    /// Compare-and-set `cart -> pending`
    ///
    /// Returns `None` when the record is missing or already checked out, so
    /// two concurrent checkouts of the same cart submit it exactly once.
    pub async fn checkout(&self, id: &str) -> RepoResult<Option<StoreTransaction>> {
        self.cas_status(id, TransactionStatus::Cart, TransactionStatus::Pending)
            .await
    }

    /// Compare-and-set `pending -> approved | rejected`
    ///
    /// Returns `None` when the transaction is not awaiting disposition.
    pub async fn disposition(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> RepoResult<Option<StoreTransaction>> {
        self.cas_status(id, TransactionStatus::Pending, status).await
    }

    async fn cas_status(
        &self,
        id: &str,
        expected: TransactionStatus,
        next: TransactionStatus,
    ) -> RepoResult<Option<StoreTransaction>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET status = $next \
                 WHERE status = $expected RETURN AFTER",
            )
            .bind(("thing", record_id(TRANSACTION_TABLE, id)))
            .bind(("next", next))
            .bind(("expected", expected))
            .await?;
        let transactions: Vec<StoreTransaction> = result.take(0)?;
        Ok(transactions.into_iter().next())
    }
}
