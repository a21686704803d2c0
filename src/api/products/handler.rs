//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Stock count must not be negative"))]
    pub count_in_stock: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "Stock count must not be negative"))]
    pub count_in_stock: Option<i64>,
    pub image_url: Option<String>,
}

/// GET /api/products
pub async fn list(
    State(state): State<ServerState>,
    _user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let repo = ProductRepository::new(state.db.db.clone());
    Ok(ok(repo.find_all().await?))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Product>>> {
    let repo = ProductRepository::new(state.db.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;
    Ok(ok(product))
}

/// POST /api/products - admin only
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<CreateProductRequest>,
) -> AppResult<Json<AppResponse<Product>>> {
    user.require_admin()?;
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = ProductRepository::new(state.db.db.clone());
    if repo.find_by_name(&req.name).await?.is_some() {
        return Err(AppError::conflict("Product name already exists"));
    }

    let product = repo
        .create(ProductCreate {
            name: req.name,
            description: req.description,
            price: req.price,
            count_in_stock: req.count_in_stock,
            image_url: req.image_url,
        })
        .await?;

    tracing::info!(admin = %user.username, product = %product.name, "Product created");
    Ok(ok(product))
}

/// PUT /api/products/{id} - admin only
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> AppResult<Json<AppResponse<Product>>> {
    user.require_admin()?;
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = ProductRepository::new(state.db.db.clone());

    if let Some(name) = &req.name {
        if let Some(existing) = repo.find_by_name(name).await? {
            let existing_key = existing.id.as_ref().map(|t| t.key().to_string());
            let target_key = id.strip_prefix("product:").unwrap_or(&id);
            if existing_key.as_deref() != Some(target_key) {
                return Err(AppError::conflict("Product name already exists"));
            }
        }
    }

    let product = repo
        .update(
            &id,
            ProductUpdate {
                name: req.name,
                description: req.description,
                price: req.price,
                count_in_stock: req.count_in_stock,
                image_url: req.image_url,
            },
        )
        .await?;

    Ok(ok(product))
}

/// DELETE /api/products/{id} - admin only
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    user.require_admin()?;

    let repo = ProductRepository::new(state.db.db.clone());
    repo.delete(&id).await?;

    tracing::info!(admin = %user.username, product = %id, "Product deleted");
    Ok(ok(true))
}
