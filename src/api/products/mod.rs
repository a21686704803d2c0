//! Products API module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/products | GET | token |
//! | /api/products | POST | admin |
//! | /api/products/{id} | GET | token |
//! | /api/products/{id} | PUT/DELETE | admin |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
