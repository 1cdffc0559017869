use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use market_catalog::{CatalogError, Product, RECOMMEND_LIMIT, SEARCH_LIMIT};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub keyword: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_products))
        .route("/recommend/{product_id}", get(recommend_products))
}

/// GET /api/search?keyword=
/// Case-insensitive name match, newest first. An empty keyword matches everything.
pub async fn search_products(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(params) = params?;
    let products = state
        .products
        .search_by_name(params.keyword.trim(), SEARCH_LIMIT)
        .await?;
    Ok(Json(products))
}

/// GET /api/recommend/{product_id}
/// Random picks from the same category
pub async fn recommend_products(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Path(product_id) = path?;
    let product = state
        .products
        .get_product(product_id)
        .await?
        .ok_or(CatalogError::NotFound)?;

    let Some(category_id) = product.category_id else {
        return Ok(Json(Vec::new()));
    };

    let products = state
        .products
        .recommend(category_id, product_id, RECOMMEND_LIMIT)
        .await?;
    Ok(Json(products))
}
