//! Database models
//!
//! One file per table. Each model comes with its Create/Update DTOs the way
//! the repositories expect them. Record links between tables are
//! `surrealdb::RecordId` values.

pub mod enrollment;
pub mod product;
pub mod revoked_token;
pub mod transaction;
pub mod user;
pub mod voucher;

pub use enrollment::{Enrollment, EnrollmentFull, EnrollmentStatus};
pub use product::{Product, ProductCreate, ProductUpdate};
pub use revoked_token::RevokedToken;
pub use transaction::{
    StoreTransaction, TransactionCreate, TransactionFull, TransactionLine, TransactionLineFull,
    TransactionStatus, TransactionUpdate,
};
pub use user::{User, UserCreate, UserPublic, UserUpdate};
pub use voucher::{Voucher, VoucherCreate, VoucherUpdate};
