use market_catalog::ProductRepository;
use market_order::OrderService;
use market_store::RedisClient;
use std::sync::Arc;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    /// Accept `POST /orders` without a token.
    pub allow_guest_checkout: bool,
}

#[derive(Clone)]
pub struct WebhookConfig {
    pub secret: String,
    pub tolerance_seconds: i64,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub requests_per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub products: Arc<dyn ProductRepository>,
    pub auth: AuthConfig,
    pub webhook: WebhookConfig,
    pub client_completion_enabled: bool,
    pub metrics: Arc<Metrics>,
    /// Rate limiting is skipped when Redis is not configured.
    pub rate_limit: Option<RateLimit>,
}
