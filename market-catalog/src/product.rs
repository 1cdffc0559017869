use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One selectable value of an option group. `price` is added to the product's
/// base price when the value is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValue {
    pub label: String,
    #[serde(default)]
    pub price: i64,
}

/// A named group of option values, e.g. "size" with S/M/L.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub values: Vec<OptionValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub product_name: String,
    pub price: i64,
    pub options: Vec<OptionGroup>,
    pub is_recommended: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when a seller lists a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub product_name: String,
    pub price: i64,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub options: Vec<OptionGroup>,
    #[serde(default)]
    pub is_recommended: bool,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.product_name.trim().is_empty() || self.price <= 0 {
            return Err(CatalogError::MissingFields);
        }
        Ok(())
    }
}

/// Column a patch may assign. Names are fixed here, never taken from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductColumn {
    ProductName,
    Price,
    CategoryId,
    Options,
    IsRecommended,
}

impl ProductColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductColumn::ProductName => "product_name",
            ProductColumn::Price => "price",
            ProductColumn::CategoryId => "category_id",
            ProductColumn::Options => "options",
            ProductColumn::IsRecommended => "is_recommended",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Text(String),
    Int(i64),
    Options(Vec<OptionGroup>),
    Flag(bool),
}

/// Partial update of a product. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub product_name: Option<String>,
    pub price: Option<i64>,
    pub category_id: Option<i64>,
    pub options: Option<Vec<OptionGroup>>,
    pub is_recommended: Option<bool>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.is_empty() {
            return Err(CatalogError::EmptyPatch);
        }
        if matches!(&self.product_name, Some(name) if name.trim().is_empty()) {
            return Err(CatalogError::InvalidField("product_name"));
        }
        if matches!(self.price, Some(price) if price <= 0) {
            return Err(CatalogError::InvalidField("price"));
        }
        Ok(())
    }

    /// `SET` assignments in a stable column order.
    pub fn assignments(&self) -> Vec<(ProductColumn, PatchValue)> {
        let mut out = Vec::new();
        if let Some(name) = &self.product_name {
            out.push((ProductColumn::ProductName, PatchValue::Text(name.clone())));
        }
        if let Some(price) = self.price {
            out.push((ProductColumn::Price, PatchValue::Int(price)));
        }
        if let Some(category_id) = self.category_id {
            out.push((ProductColumn::CategoryId, PatchValue::Int(category_id)));
        }
        if let Some(options) = &self.options {
            out.push((ProductColumn::Options, PatchValue::Options(options.clone())));
        }
        if let Some(flag) = self.is_recommended {
            out.push((ProductColumn::IsRecommended, PatchValue::Flag(flag)));
        }
        out
    }

    /// Apply to an in-memory product, mirroring what the SQL update does.
    pub fn apply_to(&self, product: &mut Product) {
        for (column, value) in self.assignments() {
            match (column, value) {
                (ProductColumn::ProductName, PatchValue::Text(v)) => product.product_name = v,
                (ProductColumn::Price, PatchValue::Int(v)) => product.price = v,
                (ProductColumn::CategoryId, PatchValue::Int(v)) => product.category_id = Some(v),
                (ProductColumn::Options, PatchValue::Options(v)) => product.options = v,
                (ProductColumn::IsRecommended, PatchValue::Flag(v)) => product.is_recommended = v,
                _ => {}
            }
        }
    }
}

/// Listing filter for `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub seller_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Only products flagged for the home page.
    #[serde(default)]
    pub home: bool,
    /// Order by view count instead of recency.
    #[serde(default)]
    pub best: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.seller_id.map_or(true, |id| product.seller_id == id)
            && self.category_id.map_or(true, |id| product.category_id == Some(id))
            && (!self.home || product.is_recommended)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Nothing to update")]
    EmptyPatch,

    #[error("Invalid value for {0}")]
    InvalidField(&'static str),

    #[error("Product not found")]
    NotFound,

    #[error("Product belongs to another seller")]
    NotOwner,

    #[error("Catalog storage failed: {0}")]
    Storage(String),
}
