//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::error::HttpError;
use crate::web::state::{AppState, AuthUser};

/// Middleware that validates the bearer token and identifies the caller.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// A missing header is 401; a token that fails verification is 403.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    // 1. Extract the token from "Authorization: Bearer <token>"
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HttpError::Unauthorized("Authentication required".to_string()))?;

    // 2. Verify signature and expiry
    let claims = state.tokens.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        HttpError::Forbidden("Invalid or expired token".to_string())
    })?;

    // 3. Hand the caller to the handler
    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(req).await)
}
