//! Product catalog and review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use techshop_core::{Price, ProductId, Rating};

use crate::db::RepositoryError;
use crate::db::products::{ProductEdit, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Product;
use crate::routes::MessageResponse;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters for catalog listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring to match against product names.
    pub keyword: Option<String>,
}

/// Full-replace edit of a product's editable fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub brand: String,
    pub category: String,
    pub count_in_stock: i32,
    pub description: String,
}

/// Review submission body. The author's identity comes from the bearer
/// token, never from the body.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: String,
}

impl UpdateProductRequest {
    fn into_edit(self) -> Result<ProductEdit> {
        let price = Price::parse(self.price)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if self.count_in_stock < 0 {
            return Err(AppError::BadRequest(
                "countInStock cannot be negative".to_owned(),
            ));
        }

        Ok(ProductEdit {
            name: self.name,
            price,
            image: self.image,
            brand: self.brand,
            category: self.category,
            count_in_stock: self.count_in_stock,
            description: self.description,
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List the catalog, optionally filtered by keyword.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list(query.keyword.as_deref())
        .await?;

    Ok(Json(products))
}

/// Fetch a single product with its reviews.
///
/// # Errors
///
/// Returns 404 when the product doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;

    Ok(Json(product))
}

/// Create a placeholder product for immediate editing (admin only).
///
/// # Errors
///
/// Returns 401 unless the caller is an admin.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductRepository::new(state.pool())
        .create_placeholder()
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's editable fields (admin only).
///
/// # Errors
///
/// Returns 404 when the product doesn't exist, 400 on invalid fields.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let edit = body.into_edit()?;

    let product = ProductRepository::new(state.pool())
        .update(id, &edit)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("product not found".to_owned()),
            other => other.into(),
        })?;

    Ok(Json(product))
}

/// Hard-delete a product (admin only).
///
/// # Errors
///
/// Returns 404 when the product doesn't exist.
pub async fn destroy(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("product not found".to_owned()),
            other => other.into(),
        })?;

    Ok(Json(MessageResponse::new("product removed")))
}

/// Add a review to a product.
///
/// One review per user per product; the rating must be 1-5 stars.
///
/// # Errors
///
/// Returns 404 when the product doesn't exist, 409 when the caller already
/// reviewed it, 400 on an out-of-range rating.
pub async fn create_review(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let rating =
        Rating::parse(body.rating).map_err(|e| AppError::BadRequest(e.to_string()))?;

    ProductRepository::new(state.pool())
        .add_review(id, user.id, &user.name, rating, &body.comment)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("product not found".to_owned()),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("review added"))))
}
