use async_trait::async_trait;

use crate::product::{CatalogError, NewProduct, Product, ProductFilter, ProductPatch};

/// Product catalog data access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError>;

    async fn get_product(&self, id: i64) -> Result<Option<Product>, CatalogError>;

    async fn create_product(&self, seller_id: i64, product: &NewProduct) -> Result<i64, CatalogError>;

    /// Returns `false` when no row matched.
    async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<bool, CatalogError>;

    /// Returns `false` when no row matched.
    async fn delete_product(&self, id: i64) -> Result<bool, CatalogError>;

    /// Case-insensitive substring match on the name, newest first.
    async fn search_by_name(&self, keyword: &str, limit: i64) -> Result<Vec<Product>, CatalogError>;

    /// Random sample from `category_id`, never including `exclude_id`.
    async fn recommend(
        &self,
        category_id: i64,
        exclude_id: i64,
        limit: i64,
    ) -> Result<Vec<Product>, CatalogError>;
}
