mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{order_body, TestApp, WEBHOOK_SECRET};
use market_core::webhook::{sign, SIGNATURE_HEADER};
use market_order::{OrderRepository, OrderStatus};
use serde_json::{json, Value};

fn callback(signature: Option<String>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/orders/webhook")
        .header("Content-Type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn signed(body: &str) -> Option<String> {
    Some(sign(body.as_bytes(), WEBHOOK_SECRET, chrono::Utc::now().timestamp()).unwrap())
}

async fn placed_order(app: &TestApp) -> i64 {
    let (status, body) = app.place_order(&order_body(), None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["order_id"].as_i64().unwrap()
}

fn payload(merchant_uid: &str, status: &str) -> String {
    json!({"imp_uid": "imp_100200300", "merchant_uid": merchant_uid, "status": status}).to_string()
}

#[tokio::test]
async fn test_signed_paid_callback_updates_order() {
    let app = TestApp::new();
    let order_id = placed_order(&app).await;
    let body = payload(&format!("order_{}", order_id), "paid");

    let (status, reply) = app.send(callback(signed(&body), &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["status"], "paid");
    let order = app.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_failed_and_cancelled_callbacks() {
    let app = TestApp::new();
    let order_id = placed_order(&app).await;

    for (provider, expected) in [("failed", OrderStatus::Failed), ("cancelled", OrderStatus::Cancelled)] {
        let body = payload(&format!("order_{}", order_id), provider);
        let (status, _) = app.send(callback(signed(&body), &body)).await;
        assert_eq!(status, StatusCode::OK);
        let order = app.orders.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, expected);
    }
}

#[tokio::test]
async fn test_unsigned_or_forged_callbacks_change_nothing() {
    let app = TestApp::new();
    let order_id = placed_order(&app).await;
    let body = payload(&format!("order_{}", order_id), "paid");

    let (status, _) = app.send(callback(None, &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = sign(body.as_bytes(), "not-the-secret", chrono::Utc::now().timestamp()).unwrap();
    let (status, _) = app.send(callback(Some(forged), &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(callback(Some("v1=deadbeef".to_string()), &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signature made for a different body
    let other = payload("order_999", "paid");
    let (status, _) = app.send(callback(signed(&other), &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let order = app.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_stale_signature_is_rejected() {
    let app = TestApp::new();
    let order_id = placed_order(&app).await;
    let body = payload(&format!("order_{}", order_id), "paid");

    let stale = sign(body.as_bytes(), WEBHOOK_SECRET, chrono::Utc::now().timestamp() - 3600).unwrap();
    let (status, _) = app.send(callback(Some(stale), &body)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let order = app.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_foreign_merchant_uid_is_a_bad_request() {
    let app = TestApp::new();
    let body = payload("mid_1700000000", "paid");

    let (status, _) = app.send(callback(signed(&body), &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_for_unknown_order() {
    let app = TestApp::new();
    let body = payload("order_9999999", "paid");

    let (status, reply) = app.send(callback(signed(&body), &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["message"], "주문을 찾을 수 없습니다.");
}

#[tokio::test]
async fn test_non_terminal_status_is_acknowledged() {
    let app = TestApp::new();
    let order_id = placed_order(&app).await;
    let body = payload(&format!("order_{}", order_id), "ready");

    let (status, reply) = app.send(callback(signed(&body), &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply.get("status"), None::<&Value>);
    let order = app.orders.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}
