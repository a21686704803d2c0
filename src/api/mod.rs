//! API route modules
//!
//! One directory per resource, each exposing a `router()` merged in
//! `core::server::build_app`:
//!
//! - [`health`] - health check
//! - [`auth`] - login / logout / me
//! - [`users`] - registration and user management
//! - [`products`] - product catalog
//! - [`vouchers`] - voucher lifecycle
//! - [`transactions`] - carts and orders

pub mod auth;
pub mod health;
pub mod products;
pub mod transactions;
pub mod users;
pub mod vouchers;

pub use crate::utils::{AppResponse, AppResult};

use crate::auth::CurrentUser;
use crate::utils::AppError;

/// Strip the `user:` table prefix from an id in either form
fn user_key(id: &str) -> &str {
    id.strip_prefix("user:").unwrap_or(id)
}

/// Allow a user through for their own records, admins for anyone's
pub(crate) fn ensure_self_or_admin(user: &CurrentUser, target_id: &str) -> Result<(), AppError> {
    if user.is_admin() || user_key(&user.id) == user_key(target_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("Not allowed to access this resource"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_or_admin_check() {
        let admin = CurrentUser {
            id: "user:a1".into(),
            username: "root".into(),
            role: "admin".into(),
        };
        let user = CurrentUser {
            id: "user:b2".into(),
            username: "alice".into(),
            role: "user".into(),
        };

        assert!(ensure_self_or_admin(&admin, "b2").is_ok());
        assert!(ensure_self_or_admin(&user, "b2").is_ok());
        assert!(ensure_self_or_admin(&user, "user:b2").is_ok());
        assert!(ensure_self_or_admin(&user, "c3").is_err());
    }
}
