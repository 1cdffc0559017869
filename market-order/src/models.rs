use chrono::{DateTime, Utc};
use market_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OrderError;

/// Order status in the lifecycle. New orders always start as `Pending`;
/// later updates may set any status (last write wins).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "failed" => Ok(OrderStatus::Failed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::InvalidStatus(other.to_string())),
        }
    }
}

/// A buyer's reservation of a product, as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub user_id: Option<i64>,
    pub product_id: i64,
    pub reservation_date: String,
    pub reservation_time: String,
    pub customer_name: String,
    pub contact_phone: Masked<String>,
    pub contact_email: Masked<String>,
    pub address: Masked<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert. There is no status field: inserts are always `pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<i64>,
    pub product_id: i64,
    pub reservation_date: String,
    pub reservation_time: String,
    pub customer_name: String,
    pub contact_phone: Masked<String>,
    pub contact_email: Masked<String>,
    pub address: Masked<String>,
}

/// Checkout body as received. Every field is optional here so that a missing
/// field surfaces as a validation error rather than a JSON rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderRequest {
    pub product_id: Option<i64>,
    pub reservation_date: Option<String>,
    pub reservation_time: Option<String>,
    pub customer_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub amount: Option<i64>,
}

/// A checkout that passed validation.
#[derive(Debug, Clone)]
pub struct PlaceOrderInput {
    pub order: NewOrder,
    pub amount: i64,
}

fn required_text(value: Option<String>) -> Result<String, OrderError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(OrderError::MissingField)
}

fn required_positive(value: Option<i64>) -> Result<i64, OrderError> {
    value.filter(|v| *v > 0).ok_or(OrderError::MissingField)
}

impl PlaceOrderRequest {
    pub fn validate(self, user_id: Option<i64>) -> Result<PlaceOrderInput, OrderError> {
        let product_id = required_positive(self.product_id)?;
        let reservation_date = required_text(self.reservation_date)?;
        let reservation_time = required_text(self.reservation_time)?;
        let customer_name = required_text(self.customer_name)?;
        let contact_phone = required_text(self.contact_phone)?;
        let contact_email = required_text(self.contact_email)?;
        let address = required_text(self.address)?;
        let amount = required_positive(self.amount)?;

        Ok(PlaceOrderInput {
            order: NewOrder {
                user_id,
                product_id,
                reservation_date,
                reservation_time,
                customer_name,
                contact_phone: Masked::new(contact_phone),
                contact_email: Masked::new(contact_email),
                address: Masked::new(address),
            },
            amount,
        })
    }
}
