//! User API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::ensure_self_or_admin;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserCreate, UserPublic, UserUpdate};
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateRequest {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PrivilegeRequest {
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub points: i64,
}

/// Email and username uniqueness pre-checks shared by create paths
async fn check_unique(
    repo: &UserRepository,
    email: &str,
    username: &str,
    exclude_id: Option<&str>,
) -> AppResult<()> {
    let exclude = exclude_id.map(|id| id.strip_prefix("user:").unwrap_or(id));
    if let Some(existing) = repo.find_by_email(email).await? {
        let key = existing.id.as_ref().map(|t| t.key().to_string());
        if key.as_deref() != exclude {
            return Err(AppError::conflict("Email already registered"));
        }
    }
    if let Some(existing) = repo.find_by_username(username).await? {
        let key = existing.id.as_ref().map(|t| t.key().to_string());
        if key.as_deref() != exclude {
            return Err(AppError::conflict("Username already taken"));
        }
    }
    Ok(())
}

async fn create_user(
    repo: &UserRepository,
    username: String,
    email: String,
    password: &str,
    phone_number: Option<String>,
    gender: Option<String>,
    is_admin: bool,
) -> AppResult<User> {
    check_unique(repo, &email, &username, None).await?;

    let password_hash = User::hash_password(password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;

    Ok(repo
        .create(UserCreate {
            username,
            email,
            password_hash,
            phone_number,
            gender,
            is_admin,
            is_active: true,
        })
        .await?)
}

/// POST /api/users - public registration
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = UserRepository::new(state.db.db.clone());
    let user = create_user(
        &repo,
        req.username,
        req.email,
        &req.password,
        req.phone_number,
        req.gender,
        false,
    )
    .await?;

    tracing::info!(username = %user.username, "User registered");
    Ok(ok_with_message(user.into(), "Registered"))
}

/// POST /api/users/admin - admin account creation
pub async fn admin_create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<AdminCreateRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    current.require_admin()?;
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = UserRepository::new(state.db.db.clone());
    let user = create_user(
        &repo,
        req.username,
        req.email,
        &req.password,
        req.phone_number,
        req.gender,
        req.is_admin,
    )
    .await?;

    tracing::info!(admin = %current.username, username = %user.username, "User created by admin");
    Ok(ok(user.into()))
}

/// GET /api/users - admin listing
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<UserPublic>>>> {
    current.require_admin()?;

    let repo = UserRepository::new(state.db.db.clone());
    let users = repo.find_all().await?;
    Ok(ok(users.into_iter().map(UserPublic::from).collect()))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    ensure_self_or_admin(&current, &id)?;

    let repo = UserRepository::new(state.db.db.clone());
    let user = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", id)))?;
    Ok(ok(user.into()))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    ensure_self_or_admin(&current, &id)?;
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // Only staff may toggle account activation
    if req.is_active.is_some() && !current.is_admin() {
        return Err(AppError::forbidden("Only administrators can change activation"));
    }

    let repo = UserRepository::new(state.db.db.clone());
    let existing = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", id)))?;

    let email = req.email.clone().unwrap_or_else(|| existing.email.clone());
    let username = req
        .username
        .clone()
        .unwrap_or_else(|| existing.username.clone());
    check_unique(&repo, &email, &username, Some(&id)).await?;

    let password_hash = match &req.password {
        Some(password) => Some(
            User::hash_password(password)
                .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?,
        ),
        None => None,
    };

    let user = repo
        .update(
            &id,
            UserUpdate {
                username: req.username,
                email: req.email,
                password_hash,
                phone_number: req.phone_number,
                gender: req.gender,
                points: None,
                is_active: req.is_active,
            },
        )
        .await?;

    Ok(ok(user.into()))
}

/// DELETE /api/users/{id} - admin only
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    current.require_admin()?;

    let repo = UserRepository::new(state.db.db.clone());
    repo.delete(&id).await?;

    tracing::info!(admin = %current.username, user = %id, "User deleted");
    Ok(ok(true))
}

/// PUT /api/users/{id}/privilege - admin only
pub async fn set_privilege(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<PrivilegeRequest>,
) -> AppResult<Json<AppResponse<UserPublic>>> {
    current.require_admin()?;

    let repo = UserRepository::new(state.db.db.clone());
    let user = repo.set_admin(&id, req.is_admin).await?;

    tracing::info!(admin = %current.username, user = %id, is_admin = req.is_admin, "Privilege changed");
    Ok(ok(user.into()))
}

/// GET /api/users/{id}/points
pub async fn get_points(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<PointsResponse>>> {
    ensure_self_or_admin(&current, &id)?;

    let repo = UserRepository::new(state.db.db.clone());
    let user = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", id)))?;
    Ok(ok(PointsResponse {
        points: user.points,
    }))
}
