use anyhow::Context;
use market_api::{
    app,
    metrics::Metrics,
    state::{AppState, AuthConfig, RateLimit, WebhookConfig},
};
use market_order::{OrderOptions, OrderService, PaymentOrchestrator};
use market_store::{Config, DbClient, PgOrderRepository, PgProductRepository, PortOneGateway, RedisClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_api=debug,market_order=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting HandsMarket API on port {}", config.server.port);
    market_api::error::expose_error_details(config.server.expose_error_details);

    // Postgres
    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    // Redis is optional; without it requests are not rate limited
    let rate_limit = match &config.redis {
        Some(redis) => {
            let client = RedisClient::new(&redis.url)
                .await
                .context("Failed to create Redis client")?;
            Some(RateLimit {
                redis: Arc::new(client),
                requests_per_minute: redis.requests_per_minute,
            })
        }
        None => {
            tracing::warn!("No [redis] section configured, rate limiting disabled");
            None
        }
    };

    let gateway = PortOneGateway::new(
        &config.payments.base_url,
        &config.payments.api_key,
        config.payments.timeout_seconds,
    )?;
    let order_service = OrderService::new(
        Arc::new(PgOrderRepository::new(db.pool.clone())),
        PaymentOrchestrator::new(Arc::new(gateway)),
        OrderOptions {
            compensate_on_gateway_failure: config.orders.compensate_on_gateway_failure,
        },
    );

    let app_state = AppState {
        orders: Arc::new(order_service),
        products: Arc::new(PgProductRepository::new(db.pool.clone())),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            allow_guest_checkout: config.auth.allow_guest_checkout,
        },
        webhook: WebhookConfig {
            secret: config.payments.webhook_secret.clone(),
            tolerance_seconds: config.payments.webhook_tolerance_seconds,
        },
        client_completion_enabled: config.orders.client_completion_enabled,
        metrics: Arc::new(Metrics::new()?),
        rate_limit,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down");
    })
    .await?;

    Ok(())
}
