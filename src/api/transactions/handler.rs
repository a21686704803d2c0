//! Transaction API Handlers
//!
//! Cart routes act on behalf of the user in the path; the engine enforces
//! the one-cart invariant and the checkout/disposition state machine.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::api::ensure_self_or_admin;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    StoreTransaction, TransactionCreate, TransactionFull, TransactionUpdate,
};
use crate::services::CartService;
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct DispositionRequest {
    /// approved | rejected
    pub status: String,
}

/// GET /api/transactions - admin listing, products resolved
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<TransactionFull>>>> {
    user.require_admin()?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service.list_all().await?))
}

/// GET /api/transactions/user/{user_id}
pub async fn list_by_user(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<TransactionFull>>>> {
    ensure_self_or_admin(&user, &user_id)?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service.list_by_user(&user_id).await?))
}

/// POST /api/transactions - admin free-form create
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<TransactionCreate>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    user.require_admin()?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service.create(req).await?))
}

/// GET /api/transactions/{id} - admin only
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    user.require_admin()?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service.get(&id).await?))
}

/// PUT /api/transactions/{id} - admin free-form patch
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<TransactionUpdate>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    user.require_admin()?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service.update(&id, req).await?))
}

/// DELETE /api/transactions/{id} - admin only
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    user.require_admin()?;
    let service = CartService::new(state.db.db.clone());
    service.delete(&id).await?;
    Ok(ok(true))
}

/// PUT /api/transactions/{id}/disposition - admin approve/reject
pub async fn disposition(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<DispositionRequest>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    user.require_admin()?;
    let service = CartService::new(state.db.db.clone());
    let transaction = service.disposition(&id, &req.status).await?;

    tracing::info!(admin = %user.username, transaction = %id, status = %req.status, "Transaction dispositioned");
    Ok(ok(transaction))
}

/// GET /api/transactions/cart/{user_id}
pub async fn get_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    ensure_self_or_admin(&user, &user_id)?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service.get_cart(&user_id).await?))
}

/// POST /api/transactions/cart/{user_id}/lines - add (increments existing)
pub async fn add_line(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    Json(req): Json<LineRequest>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    ensure_self_or_admin(&user, &user_id)?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service
        .add_line(&user_id, &req.product_id, req.amount)
        .await?))
}

/// PUT /api/transactions/cart/{user_id}/lines - overwrite a line's amount
pub async fn set_line(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    Json(req): Json<LineRequest>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    ensure_self_or_admin(&user, &user_id)?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service
        .set_line(&user_id, &req.product_id, req.amount)
        .await?))
}

/// DELETE /api/transactions/cart/{user_id}/lines/{product_id}
pub async fn remove_line(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((user_id, product_id)): Path<(String, String)>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    ensure_self_or_admin(&user, &user_id)?;
    let service = CartService::new(state.db.db.clone());
    Ok(ok(service.remove_line(&user_id, &product_id).await?))
}

/// POST /api/transactions/cart/{user_id}/checkout
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<AppResponse<StoreTransaction>>> {
    ensure_self_or_admin(&user, &user_id)?;
    let service = CartService::new(state.db.db.clone());
    let pending = service.checkout(&user_id).await?;
    Ok(ok_with_message(pending, "Checked out for review"))
}
