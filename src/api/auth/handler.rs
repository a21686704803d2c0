//! Authentication Handlers
//!
//! Login, logout (token revocation) and current-user lookup.

use std::time::Duration;

use axum::{Json, extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::db::models::UserPublic;
use crate::db::repository::{RevokedTokenRepository, UserRepository};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// Fixed delay for authentication to blunt timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserPublic,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<LoginResponse>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let users = UserRepository::new(state.db.db.clone());
    let user = users.find_by_email(&req.email).await?;

    // Fixed delay before inspecting the result, so lookups for unknown and
    // known accounts take the same time
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent account enumeration
    let user = match user {
        Some(u) => u,
        None => {
            tracing::warn!(email = %req.email, "Login failed, account not found");
            return Err(AppError::invalid_credentials());
        }
    };

    if !user.is_active {
        return Err(AppError::forbidden("Account has been disabled"));
    }

    let password_valid = user
        .verify_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();

    if !password_valid {
        users.increment_failed_attempts(&user_id).await?;
        tracing::warn!(email = %req.email, "Login failed, invalid credentials");
        return Err(AppError::invalid_credentials());
    }

    users.reset_failed_attempts(&user_id).await?;

    let role = if user.is_admin { "admin" } else { "user" };
    let token = state
        .jwt_service
        .generate_token(&user_id, &user.username, role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user = %user_id, username = %user.username, "User logged in");

    Ok(ok(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/logout
///
/// Puts the presented token on the revocation blacklist until its expiry.
pub async fn logout(
    State(state): State<ServerState>,
    headers: HeaderMap,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<()>>> {
    let token = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(JwtService::extract_from_header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let claims = state
        .jwt_service
        .validate_token(token)
        .map_err(|e| AppError::invalid_token(e.to_string()))?;

    let revoked_tokens = RevokedTokenRepository::new(state.db.db.clone());
    revoked_tokens
        .insert(token.to_string(), claims.exp * 1000)
        .await?;

    tracing::info!(user = %user.id, username = %user.username, "User logged out");

    Ok(ok_with_message((), "Logged out"))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    let users = UserRepository::new(state.db.db.clone());
    let record = users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", user.id)))?;

    Ok(ok(record.into()))
}
