use axum::{
    body::Body,
    http::{header, Method, Request},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod error;
pub mod metrics;
pub mod middleware;
pub mod orders;
pub mod products;
pub mod search;
pub mod state;
pub mod webhooks;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::USER_AGENT]);

    let api = Router::new()
        .merge(orders::routes(state.clone()))
        .merge(products::routes(state.clone()))
        .merge(search::routes());

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics::metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = %Uuid::new_v4(),
            )
        }))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit_middleware))
        .with_state(state)
}
