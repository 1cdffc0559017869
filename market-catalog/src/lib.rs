pub mod product;
pub mod repository;
pub mod memory;

pub use product::{
    CatalogError, NewProduct, OptionGroup, OptionValue, PatchValue, Product, ProductColumn, ProductFilter,
    ProductPatch,
};
pub use repository::ProductRepository;
pub use memory::InMemoryProductRepository;

/// Maximum rows returned by a name search.
pub const SEARCH_LIMIT: i64 = 20;

/// Maximum rows returned by a recommendation.
pub const RECOMMEND_LIMIT: i64 = 5;
