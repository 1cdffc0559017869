use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Attach the error chain to 500 responses. Development only.
    #[serde(default)]
    pub expose_error_details: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_true")]
    pub allow_guest_checkout: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    #[serde(default = "default_gateway_url")]
    pub base_url: String,
    pub api_key: String,
    pub webhook_secret: String,
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_seconds: i64,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrdersConfig {
    #[serde(default = "default_true")]
    pub compensate_on_gateway_failure: bool,
    /// Keep the unauthenticated `POST /orders/complete` route.
    #[serde(default = "default_true")]
    pub client_completion_enabled: bool,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            compensate_on_gateway_failure: true,
            client_completion_enabled: true,
        }
    }
}

fn default_true() -> bool { true }
fn default_max_connections() -> u32 { 10 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_requests_per_minute() -> i64 { 100 }
fn default_gateway_url() -> String { "https://api.iamport.kr".to_string() }
fn default_webhook_tolerance() -> i64 { 300 }
fn default_gateway_timeout() -> u64 { 10 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `MARKET__PAYMENTS__API_KEY=...`
            .add_source(config::Environment::with_prefix("MARKET").separator("__"))
            .build()?
            .try_deserialize()
    }
}
