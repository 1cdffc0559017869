use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried by tokens the user service issues at login.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub user_id: i64,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

fn bearer_token(headers: &HeaderMap) -> Option<Result<&str, AppError>> {
    let value = headers.get("Authorization")?;
    Some(
        value
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized),
    )
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::Unauthorized
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// A valid bearer token is required; its claims are put into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or(AppError::Unauthorized)??;
    let claims = decode_claims(token, &state.auth.secret)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Checkout auth: a token, when sent, must be valid. Without one the request
/// continues as a guest if guest checkout is enabled.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match bearer_token(req.headers()) {
        Some(token) => {
            let claims = decode_claims(token?, &state.auth.secret)?;
            req.extensions_mut().insert(claims);
        }
        None if state.auth.allow_guest_checkout => {}
        None => return Err(AppError::Unauthorized),
    }

    Ok(next.run(req).await)
}
