//! Users API module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/users | POST | none (registration) |
//! | /api/users/admin | POST | admin |
//! | /api/users | GET | admin |
//! | /api/users/{id} | GET/PUT | self or admin |
//! | /api/users/{id} | DELETE | admin |
//! | /api/users/{id}/privilege | PUT | admin |
//! | /api/users/{id}/points | GET | self or admin |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", user_routes())
}

fn user_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::register))
        .route("/admin", post(handler::admin_create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/privilege", put(handler::set_privilege))
        .route("/{id}/points", get(handler::get_points))
}
