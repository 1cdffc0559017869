use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::OrderError;
use crate::models::{NewOrder, Order, OrderStatus};
use crate::repository::OrderRepository;

/// Order store kept in process memory, with the same id and status semantics
/// as the Postgres repository.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    orders: HashMap<i64, Order>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.orders.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> Result<T, OrderError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| OrderError::Storage("order lock poisoned".to_string()))?;
        Ok(f(&mut inner))
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(&self, order: &NewOrder) -> Result<i64, OrderError> {
        self.with(|inner| {
            inner.next_id += 1;
            let id = inner.next_id;
            let now = Utc::now();
            inner.orders.insert(
                id,
                Order {
                    order_id: id,
                    user_id: order.user_id,
                    product_id: order.product_id,
                    reservation_date: order.reservation_date.clone(),
                    reservation_time: order.reservation_time.clone(),
                    customer_name: order.customer_name.clone(),
                    contact_phone: order.contact_phone.clone(),
                    contact_email: order.contact_email.clone(),
                    address: order.address.clone(),
                    status: OrderStatus::Pending,
                    created_at: now,
                    updated_at: now,
                },
            );
            id
        })
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, OrderError> {
        self.with(|inner| inner.orders.get(&id).cloned())
    }

    async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<bool, OrderError> {
        self.with(|inner| match inner.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                order.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>, OrderError> {
        self.with(|inner| {
            let mut orders: Vec<Order> = inner
                .orders
                .values()
                .filter(|o| o.user_id == Some(user_id))
                .cloned()
                .collect();
            orders.sort_by(|a, b| b.order_id.cmp(&a.order_id));
            orders
        })
    }
}
