//! Rewards Server - campus rewards and commerce backend
//!
//! A points-based campus service: students browse a product catalog, fill a
//! shopping cart and check it out into a staff-reviewed order, and earn
//! points by accepting voucher tasks that staff approve after completion.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/          # Config, ServerState, Server
//! ├── auth/          # JWT service and request extractor
//! ├── api/           # HTTP routes and handlers, one dir per resource
//! ├── services/      # voucher lifecycle and cart/transaction engines
//! ├── db/            # embedded SurrealDB, models, repositories
//! └── utils/         # AppError, response envelope, logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use services::{CartService, VoucherService};
pub use utils::{AppError, AppResponse, AppResult};
pub use utils::logger::{init_logger, init_logger_with_file};
