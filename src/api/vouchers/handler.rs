//! Voucher API Handlers
//!
//! Thin wrappers around the voucher lifecycle engine; the engine owns the
//! state machine and the atomic slot accounting.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::api::ensure_self_or_admin;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Enrollment, EnrollmentFull, Voucher, VoucherCreate, VoucherUpdate};
use crate::services::VoucherService;
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub voucher_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub voucher_id: String,
    pub user_id: String,
    /// completed | cancelled
    pub action: String,
}

/// GET /api/vouchers - vouchers with open slots
pub async fn list_available(
    State(state): State<ServerState>,
    _user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Voucher>>>> {
    let service = VoucherService::new(state.db.db.clone());
    Ok(ok(service.list_available().await?))
}

/// GET /api/vouchers/all - admin only, includes exhausted vouchers
pub async fn list_all(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Voucher>>>> {
    user.require_admin()?;
    let service = VoucherService::new(state.db.db.clone());
    Ok(ok(service.list_all().await?))
}

/// GET /api/vouchers/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Voucher>>> {
    let service = VoucherService::new(state.db.db.clone());
    Ok(ok(service.get(&id).await?))
}

/// POST /api/vouchers - admin only
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<VoucherCreate>,
) -> AppResult<Json<AppResponse<Voucher>>> {
    user.require_admin()?;
    let service = VoucherService::new(state.db.db.clone());
    Ok(ok(service.create(req).await?))
}

/// PUT /api/vouchers/{id} - admin only
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<VoucherUpdate>,
) -> AppResult<Json<AppResponse<Voucher>>> {
    user.require_admin()?;
    let service = VoucherService::new(state.db.db.clone());
    Ok(ok(service.update(&id, req).await?))
}

/// DELETE /api/vouchers/{id} - admin only
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    user.require_admin()?;
    let service = VoucherService::new(state.db.db.clone());
    service.delete(&id).await?;
    Ok(ok(true))
}

/// POST /api/vouchers/accept - accept for the calling user
pub async fn accept(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<AcceptRequest>,
) -> AppResult<Json<AppResponse<Enrollment>>> {
    let service = VoucherService::new(state.db.db.clone());
    let enrollment = service.accept(&req.voucher_id, &user.id).await?;
    Ok(ok_with_message(enrollment, "Voucher accepted"))
}

/// POST /api/vouchers/complete - the calling user marks the task done
pub async fn complete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<AcceptRequest>,
) -> AppResult<Json<AppResponse<Enrollment>>> {
    let service = VoucherService::new(state.db.db.clone());
    let enrollment = service.complete(&req.voucher_id, &user.id).await?;
    Ok(ok_with_message(enrollment, "Submitted for review"))
}

/// POST /api/vouchers/review - admin disposition of a submission
pub async fn review(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<ReviewRequest>,
) -> AppResult<Json<AppResponse<Enrollment>>> {
    user.require_admin()?;
    let service = VoucherService::new(state.db.db.clone());
    let enrollment = service
        .admin_review(&req.voucher_id, &req.user_id, &req.action)
        .await?;

    tracing::info!(
        admin = %user.username,
        voucher = %req.voucher_id,
        target = %req.user_id,
        action = %req.action,
        "Voucher reviewed"
    );
    Ok(ok(enrollment))
}

/// GET /api/vouchers/user/{user_id} - one user's enrollments
pub async fn user_statuses(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<EnrollmentFull>>>> {
    ensure_self_or_admin(&user, &user_id)?;
    let service = VoucherService::new(state.db.db.clone());
    Ok(ok(service.user_statuses(&user_id).await?))
}
