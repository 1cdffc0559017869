use async_trait::async_trait;
use chrono::{DateTime, Utc};
use market_catalog::{
    CatalogError, NewProduct, OptionGroup, PatchValue, Product, ProductFilter, ProductPatch,
    ProductRepository,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str =
    "product_id, seller_id, category_id, product_name, price, options, is_recommended, view_count, created_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_id: i64,
    seller_id: i64,
    category_id: Option<i64>,
    product_name: String,
    price: i64,
    options: Json<Vec<OptionGroup>>,
    is_recommended: bool,
    view_count: i64,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            product_id: row.product_id,
            seller_id: row.seller_id,
            category_id: row.category_id,
            product_name: row.product_name,
            price: row.price,
            options: row.options.0,
            is_recommended: row.is_recommended,
            view_count: row.view_count,
            created_at: row.created_at,
        }
    }
}

fn storage(e: sqlx::Error) -> CatalogError {
    CatalogError::Storage(e.to_string())
}

/// Escape `%`, `_` and `\` so a keyword is matched literally inside `LIKE`.
pub(crate) fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn select_products<'a>() -> QueryBuilder<'a, Postgres> {
    QueryBuilder::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS))
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        let mut qb = select_products();
        qb.push(" WHERE TRUE");
        if let Some(seller_id) = filter.seller_id {
            qb.push(" AND seller_id = ").push_bind(seller_id);
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if filter.home {
            qb.push(" AND is_recommended = TRUE");
        }
        if filter.best {
            qb.push(" ORDER BY view_count DESC, product_id DESC");
        } else {
            qb.push(" ORDER BY created_at DESC, product_id DESC");
        }

        let rows: Vec<ProductRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let mut qb = select_products();
        qb.push(" WHERE product_id = ").push_bind(id);

        let row: Option<ProductRow> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(Product::from))
    }

    async fn create_product(&self, seller_id: i64, product: &NewProduct) -> Result<i64, CatalogError> {
        sqlx::query_scalar(
            r#"
            INSERT INTO products (seller_id, category_id, product_name, price, options, is_recommended)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING product_id
            "#,
        )
        .bind(seller_id)
        .bind(product.category_id)
        .bind(&product.product_name)
        .bind(product.price)
        .bind(Json(&product.options))
        .bind(product.is_recommended)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)
    }

    async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<bool, CatalogError> {
        let assignments = patch.assignments();
        if assignments.is_empty() {
            return Err(CatalogError::EmptyPatch);
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE products SET ");
        let mut set = qb.separated(", ");
        for (column, value) in assignments {
            set.push(column.as_str());
            set.push_unseparated(" = ");
            match value {
                PatchValue::Text(v) => set.push_bind_unseparated(v),
                PatchValue::Int(v) => set.push_bind_unseparated(v),
                PatchValue::Options(v) => set.push_bind_unseparated(Json(v)),
                PatchValue::Flag(v) => set.push_bind_unseparated(v),
            };
        }
        qb.push(" WHERE product_id = ").push_bind(id);

        let result = qb.build().execute(&self.pool).await.map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: i64) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_by_name(&self, keyword: &str, limit: i64) -> Result<Vec<Product>, CatalogError> {
        let pattern = format!("%{}%", escape_like(keyword));

        let mut qb = select_products();
        qb.push(" WHERE product_name ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\' ORDER BY created_at DESC, product_id DESC LIMIT ")
            .push_bind(limit);

        let rows: Vec<ProductRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn recommend(
        &self,
        category_id: i64,
        exclude_id: i64,
        limit: i64,
    ) -> Result<Vec<Product>, CatalogError> {
        let mut qb = select_products();
        qb.push(" WHERE category_id = ")
            .push_bind(category_id)
            .push(" AND product_id <> ")
            .push_bind(exclude_id)
            .push(" ORDER BY random() LIMIT ")
            .push_bind(limit);

        let rows: Vec<ProductRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("mug"), "mug");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
