use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::product::{CatalogError, NewProduct, Product, ProductFilter, ProductPatch};
use crate::repository::ProductRepository;

/// Catalog kept in process memory. Used by tests and local runs without Postgres.
#[derive(Default)]
pub struct InMemoryProductRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    products: BTreeMap<i64, Product>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully specified product, keeping its id.
    pub fn seed(&self, product: Product) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.next_id = inner.next_id.max(product.product_id);
            inner.products.insert(product.product_id, product);
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> Result<T, CatalogError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CatalogError::Storage("catalog lock poisoned".to_string()))?;
        Ok(f(&mut inner))
    }
}

fn newest_first(products: &mut [Product]) {
    products.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.product_id.cmp(&a.product_id))
    });
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        self.with(|inner| {
            let mut rows: Vec<Product> = inner
                .products
                .values()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect();
            if filter.best {
                rows.sort_by(|a, b| {
                    b.view_count
                        .cmp(&a.view_count)
                        .then(b.product_id.cmp(&a.product_id))
                });
            } else {
                newest_first(&mut rows);
            }
            rows
        })
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        self.with(|inner| inner.products.get(&id).cloned())
    }

    async fn create_product(&self, seller_id: i64, product: &NewProduct) -> Result<i64, CatalogError> {
        self.with(|inner| {
            inner.next_id += 1;
            let id = inner.next_id;
            inner.products.insert(
                id,
                Product {
                    product_id: id,
                    seller_id,
                    category_id: product.category_id,
                    product_name: product.product_name.clone(),
                    price: product.price,
                    options: product.options.clone(),
                    is_recommended: product.is_recommended,
                    view_count: 0,
                    created_at: Utc::now(),
                },
            );
            id
        })
    }

    async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<bool, CatalogError> {
        self.with(|inner| match inner.products.get_mut(&id) {
            Some(product) => {
                patch.apply_to(product);
                true
            }
            None => false,
        })
    }

    async fn delete_product(&self, id: i64) -> Result<bool, CatalogError> {
        self.with(|inner| inner.products.remove(&id).is_some())
    }

    async fn search_by_name(&self, keyword: &str, limit: i64) -> Result<Vec<Product>, CatalogError> {
        let needle = keyword.to_lowercase();
        self.with(|inner| {
            let mut rows: Vec<Product> = inner
                .products
                .values()
                .filter(|p| p.product_name.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            newest_first(&mut rows);
            rows.truncate(usize::try_from(limit).unwrap_or(0));
            rows
        })
    }

    async fn recommend(
        &self,
        category_id: i64,
        exclude_id: i64,
        limit: i64,
    ) -> Result<Vec<Product>, CatalogError> {
        self.with(|inner| {
            let candidates: Vec<&Product> = inner
                .products
                .values()
                .filter(|p| p.category_id == Some(category_id) && p.product_id != exclude_id)
                .collect();
            candidates
                .choose_multiple(&mut rand::thread_rng(), usize::try_from(limit).unwrap_or(0))
                .map(|p| (*p).clone())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn product(id: i64, name: &str, category_id: Option<i64>, age_minutes: i64) -> Product {
        Product {
            product_id: id,
            seller_id: 1,
            category_id,
            product_name: name.to_string(),
            price: 1000,
            options: vec![],
            is_recommended: id % 2 == 0,
            view_count: id * 10,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_search_caps_and_orders_newest_first() {
        let repo = InMemoryProductRepository::new();
        for id in 1..=25 {
            repo.seed(product(id, &format!("Knit Scarf {}", id), None, 100 - id));
        }
        repo.seed(product(99, "Wooden spoon", None, 0));

        let rows = repo.search_by_name("scarf", 20).await.unwrap();
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].product_id, 25);
        assert!(rows.iter().all(|p| p.product_name.contains("Scarf")));
    }

    #[tokio::test]
    async fn test_recommend_excludes_current_product() {
        let repo = InMemoryProductRepository::new();
        for id in 1..=8 {
            repo.seed(product(id, "Candle", Some(7), id));
        }
        repo.seed(product(50, "Candle", Some(8), 0));

        let rows = repo.recommend(7, 3, 5).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|p| p.product_id != 3 && p.category_id == Some(7)));
    }

    #[tokio::test]
    async fn test_list_best_orders_by_views() {
        let repo = InMemoryProductRepository::new();
        repo.seed(product(1, "a", None, 0));
        repo.seed(product(2, "b", None, 0));
        repo.seed(product(3, "c", None, 0));

        let filter = ProductFilter { best: true, ..Default::default() };
        let ids: Vec<i64> = repo.list_products(&filter).await.unwrap().iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let home = ProductFilter { home: true, ..Default::default() };
        let ids: Vec<i64> = repo.list_products(&home).await.unwrap().iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_list_best_breaks_view_ties_by_id() {
        let repo = InMemoryProductRepository::new();
        for id in [5, 9, 7] {
            repo.seed(Product { view_count: 40, ..product(id, "tie", None, 0) });
        }
        repo.seed(Product { view_count: 90, ..product(1, "top", None, 0) });

        let filter = ProductFilter { best: true, ..Default::default() };
        let ids: Vec<i64> = repo.list_products(&filter).await.unwrap().iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![1, 9, 7, 5]);
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let repo = InMemoryProductRepository::new();
        repo.seed(product(4, "seeded", None, 0));

        let id = repo
            .create_product(
                9,
                &NewProduct {
                    product_name: "Basket".to_string(),
                    price: 32000,
                    category_id: Some(2),
                    options: vec![],
                    is_recommended: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(id, 5);

        let patch = ProductPatch { price: Some(30000), ..Default::default() };
        assert!(repo.update_product(id, &patch).await.unwrap());
        assert_eq!(repo.get_product(id).await.unwrap().unwrap().price, 30000);
        assert!(!repo.update_product(404, &patch).await.unwrap());

        assert!(repo.delete_product(id).await.unwrap());
        assert!(!repo.delete_product(id).await.unwrap());
        assert!(repo.get_product(id).await.unwrap().is_none());
    }
}
