use async_trait::async_trait;
use chrono::{DateTime, Utc};
use market_order::{NewOrder, Order, OrderError, OrderRepository, OrderStatus};
use market_shared::Masked;
use sqlx::PgPool;

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str = "reservation_id, user_id, product_id, reservation_date, reservation_time, \
     customer_name, contact_phone, contact_email, address, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    reservation_id: i64,
    user_id: Option<i64>,
    product_id: i64,
    reservation_date: String,
    reservation_time: String,
    customer_name: String,
    contact_phone: String,
    contact_email: String,
    address: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = OrderError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|_| OrderError::Storage(format!("unexpected status {:?} on order {}", row.status, row.reservation_id)))?;

        Ok(Order {
            order_id: row.reservation_id,
            user_id: row.user_id,
            product_id: row.product_id,
            reservation_date: row.reservation_date,
            reservation_time: row.reservation_time,
            customer_name: row.customer_name,
            contact_phone: Masked::new(row.contact_phone),
            contact_email: Masked::new(row.contact_email),
            address: Masked::new(row.address),
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn storage(e: sqlx::Error) -> OrderError {
    OrderError::Storage(e.to_string())
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, order: &NewOrder) -> Result<i64, OrderError> {
        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO reservations
                (user_id, product_id, reservation_date, reservation_time, customer_name, contact_phone, contact_email, address, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING reservation_id
            "#,
        )
        .bind(order.user_id)
        .bind(order.product_id)
        .bind(&order.reservation_date)
        .bind(&order.reservation_time)
        .bind(&order.customer_name)
        .bind(order.contact_phone.expose())
        .bind(order.contact_email.expose())
        .bind(order.address.expose())
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        Ok(order_id)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, OrderError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE reservation_id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        row.map(Order::try_from).transpose()
    }

    async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<bool, OrderError> {
        let result = sqlx::query(
            "UPDATE reservations SET status = $1, updated_at = NOW() WHERE reservation_id = $2",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>, OrderError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE user_id = $1 ORDER BY created_at DESC, reservation_id DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
