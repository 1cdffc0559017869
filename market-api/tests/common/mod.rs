#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use market_api::metrics::Metrics;
use market_api::middleware::Claims;
use market_api::state::{AppState, AuthConfig, WebhookConfig};
use market_api::app;
use market_catalog::InMemoryProductRepository;
use market_core::payment::MockPaymentGateway;
use market_order::{InMemoryOrderRepository, OrderOptions, OrderService, PaymentOrchestrator};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

pub struct TestApp {
    pub router: Router,
    pub orders: Arc<InMemoryOrderRepository>,
    pub products: Arc<InMemoryProductRepository>,
    pub gateway: Arc<MockPaymentGateway>,
    pub metrics: Arc<Metrics>,
}

pub struct Options {
    pub gateway: MockPaymentGateway,
    pub compensate_on_gateway_failure: bool,
    pub allow_guest_checkout: bool,
    pub client_completion_enabled: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            gateway: MockPaymentGateway::approving(),
            compensate_on_gateway_failure: true,
            allow_guest_checkout: true,
            client_completion_enabled: true,
        }
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(Options::default())
    }

    pub fn with(options: Options) -> Self {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let products = Arc::new(InMemoryProductRepository::new());
        let gateway = Arc::new(options.gateway);
        let metrics = Arc::new(Metrics::new().unwrap());

        let service = OrderService::new(
            orders.clone(),
            PaymentOrchestrator::new(gateway.clone()),
            OrderOptions {
                compensate_on_gateway_failure: options.compensate_on_gateway_failure,
            },
        );

        let state = AppState {
            orders: Arc::new(service),
            products: products.clone(),
            auth: AuthConfig {
                secret: JWT_SECRET.to_string(),
                allow_guest_checkout: options.allow_guest_checkout,
            },
            webhook: WebhookConfig {
                secret: WEBHOOK_SECRET.to_string(),
                tolerance_seconds: 300,
            },
            client_completion_enabled: options.client_completion_enabled,
            metrics: metrics.clone(),
            rate_limit: None,
        };

        Self {
            router: app(state),
            orders,
            products,
            gateway,
            metrics,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, None, token)).await
    }

    pub async fn post(&self, uri: &str, body: &Value, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, Some(body), token)).await
    }

    pub async fn place_order(&self, body: &Value, token: Option<&str>) -> (StatusCode, Value) {
        self.post("/api/orders", body, token).await
    }
}

pub fn request(method: Method, uri: &str, body: Option<&Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn token_for(user_id: i64) -> String {
    token_signed_with(user_id, JWT_SECRET)
}

pub fn token_signed_with(user_id: i64, secret: &str) -> String {
    let claims = Claims {
        user_id,
        email: Some(format!("user{}@example.com", user_id)),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

pub fn order_body() -> Value {
    json!({
        "product_id": 12,
        "reservation_date": "2025-03-14",
        "reservation_time": "14:00",
        "customer_name": "Kim Minji",
        "contact_phone": "010-1234-5678",
        "contact_email": "minji@example.com",
        "address": "Seoul, Mapo-gu 12",
        "amount": 15000
    })
}
