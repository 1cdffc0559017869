use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use market_catalog::{CatalogError, NewProduct, Product, ProductFilter, ProductPatch};
use serde::Serialize;

use crate::error::{AppError, MessageResponse};
use crate::middleware::{require_auth, Claims};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductCreatedResponse {
    pub message: &'static str,
    pub product_id: i64,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(list_products).merge(
                post(create_product).route_layer(from_fn_with_state(state.clone(), require_auth)),
            ),
        )
        .route(
            "/products/{product_id}",
            get(get_product).merge(
                axum::routing::patch(update_product)
                    .delete(delete_product)
                    .route_layer(from_fn_with_state(state, require_auth)),
            ),
        )
}

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(filter) = filter?;
    let products = state.products.list_products(&filter).await?;
    Ok(Json(products))
}

/// GET /api/products/{product_id}
pub async fn get_product(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(product_id) = path?;
    let product = state
        .products
        .get_product(product_id)
        .await?
        .ok_or(CatalogError::NotFound)?;
    Ok(Json(product))
}

/// POST /api/products
/// The seller is the authenticated caller
pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductCreatedResponse>), AppError> {
    let Json(product) = payload.map_err(|_| CatalogError::MissingFields)?;
    product.validate()?;

    let product_id = state.products.create_product(claims.user_id, &product).await?;
    tracing::info!(product_id, seller_id = claims.user_id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductCreatedResponse {
            message: "Product created",
            product_id,
        }),
    ))
}

/// Load the product and check the caller is its seller.
async fn owned_product(state: &AppState, product_id: i64, claims: &Claims) -> Result<Product, AppError> {
    let product = state
        .products
        .get_product(product_id)
        .await?
        .ok_or(CatalogError::NotFound)?;

    if product.seller_id != claims.user_id {
        tracing::warn!(product_id, user_id = claims.user_id, "Product change by non-owner refused");
        return Err(CatalogError::NotOwner.into());
    }
    Ok(product)
}

/// PATCH /api/products/{product_id}
pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(product_id) = path?;
    let Json(patch) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    patch.validate()?;

    owned_product(&state, product_id, &claims).await?;
    if !state.products.update_product(product_id, &patch).await? {
        return Err(CatalogError::NotFound.into());
    }

    Ok(Json(MessageResponse {
        message: "Product updated successfully",
    }))
}

/// DELETE /api/products/{product_id}
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(product_id) = path?;
    owned_product(&state, product_id, &claims).await?;
    if !state.products.delete_product(product_id).await? {
        return Err(CatalogError::NotFound.into());
    }

    tracing::info!(product_id, "Product deleted");
    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}
