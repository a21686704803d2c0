//! Transactions API module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/transactions | GET/POST | admin |
//! | /api/transactions/{id} | GET/PUT/DELETE | admin |
//! | /api/transactions/{id}/disposition | PUT | admin |
//! | /api/transactions/user/{user_id} | GET | self or admin |
//! | /api/transactions/cart/{user_id} | GET | self or admin |
//! | /api/transactions/cart/{user_id}/lines | POST/PUT | self or admin |
//! | /api/transactions/cart/{user_id}/lines/{product_id} | DELETE | self or admin |
//! | /api/transactions/cart/{user_id}/checkout | POST | self or admin |

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/transactions", transaction_routes())
}

fn transaction_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/user/{user_id}", get(handler::list_by_user))
        .route("/cart/{user_id}", get(handler::get_cart))
        .route(
            "/cart/{user_id}/lines",
            post(handler::add_line).put(handler::set_line),
        )
        .route(
            "/cart/{user_id}/lines/{product_id}",
            delete(handler::remove_line),
        )
        .route("/cart/{user_id}/checkout", post(handler::checkout))
        .route("/{id}/disposition", put(handler::disposition))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
