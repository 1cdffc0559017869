use market_core::CoreError;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Required order field missing")]
    MissingField,

    #[error("Unknown order status: {0}")]
    InvalidStatus(String),

    #[error("Order not found: {0}")]
    NotFound(i64),

    #[error("Order {0} belongs to another user")]
    Forbidden(i64),

    /// The gateway answered with a non-zero code. `payload` is its raw reply.
    #[error("Payment preparation rejected for order {order_id}")]
    PaymentPreparationFailed { order_id: i64, payload: Value },

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] CoreError),

    #[error("Order storage failed: {0}")]
    Storage(String),
}
