use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use market_order::{Order, OrderError, PlaceOrderRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, MessageResponse, MISSING_ORDER_FIELDS};
use crate::middleware::{optional_auth, require_auth, Claims};
use crate::state::AppState;

pub const ORDER_CREATED: &str = "주문 생성 및 결제 준비 완료";
pub const ORDER_STATUS_UPDATED: &str = "주문 상태 업데이트 완료";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub message: &'static str,
    pub order_id: i64,
    pub payment_data: Value,
}

#[derive(Debug, Deserialize)]
pub struct CompleteOrderRequest {
    pub order_id: Option<i64>,
    pub status: Option<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let mut router = Router::new()
        .route(
            "/orders",
            post(place_order)
                .route_layer(from_fn_with_state(state.clone(), optional_auth))
                .merge(get(list_orders).route_layer(from_fn_with_state(state.clone(), require_auth))),
        )
        .route(
            "/orders/{order_id}",
            get(get_order).route_layer(from_fn_with_state(state.clone(), require_auth)),
        )
        .route("/orders/webhook", post(crate::webhooks::payment_webhook));

    if state.client_completion_enabled {
        router = router.route("/orders/complete", post(complete_order));
    }
    router
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/orders
/// Create a pending order and prepare its payment
pub async fn place_order(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), AppError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!("Unreadable order body: {}", e);
        AppError::Validation(MISSING_ORDER_FIELDS.to_string())
    })?;
    let user_id = claims.map(|Extension(c)| c.user_id);

    let placed = match state.orders.place_order(user_id, request).await {
        Ok(placed) => placed,
        Err(e) => {
            if matches!(e, OrderError::PaymentPreparationFailed { .. } | OrderError::Gateway(_)) {
                state.metrics.payment_prepare_failures.inc();
            }
            return Err(e.into());
        }
    };
    state.metrics.orders_placed.inc();

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            message: ORDER_CREATED,
            order_id: placed.order_id,
            payment_data: placed.payment_data,
        }),
    ))
}

/// POST /api/orders/complete
/// Client-reported payment outcome. Not authenticated.
pub async fn complete_order(
    State(state): State<AppState>,
    payload: Result<Json<CompleteOrderRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload.map_err(|_| AppError::Validation(MISSING_ORDER_FIELDS.to_string()))?;
    let (Some(order_id), Some(status)) = (request.order_id, request.status) else {
        return Err(OrderError::MissingField.into());
    };

    let status = state.orders.complete_order(order_id, &status).await?;
    state.metrics.record_status_update(status.as_str());
    tracing::info!(order_id, %status, "Order status set by client");

    Ok(Json(MessageResponse {
        message: ORDER_STATUS_UPDATED,
    }))
}

/// GET /api/orders
/// The caller's orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.orders.list_orders(claims.user_id).await?;
    Ok(Json(orders))
}

/// GET /api/orders/{order_id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(order_id) = path?;
    let order = state.orders.get_order_for(order_id, claims.user_id).await?;
    Ok(Json(order))
}
