//! Auth API module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/auth/login | POST | none |
//! | /api/auth/logout | POST | token |
//! | /api/auth/me | GET | token |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", auth_routes())
}

fn auth_routes() -> Router<ServerState> {
    Router::new()
        .route("/login", post(handler::login))
        .route("/logout", post(handler::logout))
        .route("/me", get(handler::me))
}
