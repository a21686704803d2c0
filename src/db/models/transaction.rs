//! Transaction Model
//!
//! A transaction is either the user's open shopping cart (`status = cart`)
//! or an order that went through checkout and awaits staff disposition.
//! Table name is `store_transaction` to stay clear of the SurrealQL
//! `TRANSACTION` keyword.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::Product;

pub type TransactionId = RecordId;

/// Transaction lifecycle
///
/// ```text
/// cart --checkout--> pending --disposition--> approved | rejected
/// ```
///
/// `approved` and `rejected` are terminal for the named operations; the
/// generic admin patch can still set anything (kept for compatibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Cart,
    Pending,
    Approved,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Cart => "cart",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Rejected => "rejected",
        }
    }
}

/// One cart/order line: a product reference and a quantity (>= 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLine {
    pub product: RecordId,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreTransaction {
    pub id: Option<TransactionId>,
    /// Record link to the owning user
    pub user: RecordId,
    #[serde(default)]
    pub lines: Vec<TransactionLine>,
    pub status: TransactionStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCreate {
    pub user: RecordId,
    pub lines: Vec<TransactionLine>,
    pub status: TransactionStatus,
}

/// Free-form admin patch; normal flows go through checkout/disposition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub user: Option<RecordId>,
    pub lines: Option<Vec<TransactionLine>>,
    pub status: Option<TransactionStatus>,
}

/// Line with the product record resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLineFull {
    pub product: Product,
    pub amount: i64,
}

/// Transaction with every line's product resolved, for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFull {
    pub id: String,
    pub user: RecordId,
    pub lines: Vec<TransactionLineFull>,
    pub status: TransactionStatus,
    pub created_at: i64,
}
