//! Service layer: the two domain engines
//!
//! - [`VoucherService`] - voucher lifecycle (accept, complete, review)
//! - [`CartService`] - carts, checkout and staff disposition

pub mod cart_service;
pub mod voucher_service;

pub use cart_service::CartService;
pub use voucher_service::VoucherService;
