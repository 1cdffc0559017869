use async_trait::async_trait;

use crate::error::OrderError;
use crate::models::{NewOrder, Order, OrderStatus};

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert with status `pending` and return the store-assigned id.
    async fn create_order(&self, order: &NewOrder) -> Result<i64, OrderError>;

    async fn get_order(&self, id: i64) -> Result<Option<Order>, OrderError>;

    /// Returns `false` when no row matched `id`.
    async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<bool, OrderError>;

    /// Newest first.
    async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>, OrderError>;
}
