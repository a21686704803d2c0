//! Vouchers API module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/vouchers | GET | token (open slots only) |
//! | /api/vouchers/all | GET | admin |
//! | /api/vouchers | POST | admin |
//! | /api/vouchers/{id} | GET | token |
//! | /api/vouchers/{id} | PUT/DELETE | admin |
//! | /api/vouchers/accept | POST | token |
//! | /api/vouchers/complete | POST | token |
//! | /api/vouchers/review | POST | admin |
//! | /api/vouchers/user/{user_id} | GET | self or admin |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/vouchers", voucher_routes())
}

fn voucher_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_available).post(handler::create))
        .route("/all", get(handler::list_all))
        .route("/accept", post(handler::accept))
        .route("/complete", post(handler::complete))
        .route("/review", post(handler::review))
        .route("/user/{user_id}", get(handler::user_statuses))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
