use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use market_catalog::CatalogError;
use market_order::OrderError;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};

pub const MISSING_ORDER_FIELDS: &str = "필수 필드가 없습니다.";
pub const ORDER_NOT_FOUND: &str = "주문을 찾을 수 없습니다.";
pub const PAYMENT_PREPARE_FAILED: &str = "결제 준비 실패";

/// Body of responses that only carry a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Attach the error chain to 500 bodies. Set once at startup from config.
pub fn expose_error_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Forbidden(String),
    Validation(String),
    NotFound(String),
    TooManyRequests,
    /// Gateway declined or could not be reached. Carries the payload for the client.
    PaymentPreparation(Value),
    Internal(anyhow::Error),
}

impl AppError {
    fn internal_body(err: &anyhow::Error, expose: bool) -> Value {
        if expose {
            json!({ "message": "Internal Server Error", "detail": format!("{:#}", err) })
        } else {
            json!({ "message": "Internal Server Error" })
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "message": "Unauthorized" })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "message": msg })),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "message": "Rate limit exceeded" }),
            ),
            AppError::PaymentPreparation(payload) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": PAYMENT_PREPARE_FAILED, "error": payload }),
            ),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Self::internal_body(&err, EXPOSE_DETAILS.load(Ordering::Relaxed)),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::MissingField => AppError::Validation(MISSING_ORDER_FIELDS.to_string()),
            OrderError::InvalidStatus(_) => AppError::Validation(err.to_string()),
            OrderError::NotFound(_) => AppError::NotFound(ORDER_NOT_FOUND.to_string()),
            OrderError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            OrderError::PaymentPreparationFailed { payload, .. } => AppError::PaymentPreparation(payload),
            OrderError::Gateway(e) => AppError::PaymentPreparation(json!({ "message": e.to_string() })),
            OrderError::Storage(_) => AppError::Internal(err.into()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingFields | CatalogError::EmptyPatch | CatalogError::InvalidField(_) => {
                AppError::Validation(err.to_string())
            }
            CatalogError::NotFound => AppError::NotFound(err.to_string()),
            CatalogError::NotOwner => AppError::Forbidden(err.to_string()),
            CatalogError::Storage(_) => AppError::Internal(err.into()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}
