use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use market_core::webhook::{self, PaymentCallback, SIGNATURE_HEADER};
use serde_json::{json, Value};

use crate::error::{AppError, MISSING_ORDER_FIELDS};
use crate::orders::ORDER_STATUS_UPDATED;
use crate::state::AppState;

/// POST /api/orders/webhook
/// Payment provider callback. The signature is checked against the raw body
/// before anything is parsed.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Payment callback without signature");
            AppError::Unauthorized
        })?;

    webhook::verify(
        &body,
        signature,
        &state.webhook.secret,
        state.webhook.tolerance_seconds,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| {
        tracing::warn!("Payment callback rejected: {}", e);
        AppError::Unauthorized
    })?;

    let callback: PaymentCallback = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Unreadable payment callback: {}", e);
        AppError::Validation(MISSING_ORDER_FIELDS.to_string())
    })?;

    match state.orders.apply_payment_callback(&callback).await? {
        Some(status) => {
            state.metrics.record_status_update(status.as_str());
            Ok(Json(json!({ "message": ORDER_STATUS_UPDATED, "status": status })))
        }
        None => Ok(Json(json!({ "message": "Callback acknowledged" }))),
    }
}
