pub mod payment;
pub mod webhook;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Payment gateway unreachable: {0}")]
    GatewayError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
