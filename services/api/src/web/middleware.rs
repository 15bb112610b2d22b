//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashboard_core::ports::PortError;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::security::bearer_token;
use crate::web::state::{AppState, AuthUser};

/// Middleware that validates the bearer token and resolves the caller.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the bearer token
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;

    // 2. Verify signature and expiry
    let claims = state
        .tokens
        .verify(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    // 3. The user must still exist and be active
    let user = match state.db.get_user_by_id(claims.user_id).await {
        Ok(user) if user.is_active => user,
        Ok(_) | Err(PortError::NotFound(_)) => {
            return Err(ApiError::Unauthorized(
                "User not found or inactive".to_string(),
            ))
        }
        Err(e) => {
            error!("Failed to load user for token: {:?}", e);
            return Err(ApiError::Port(e));
        }
    };

    // 4. Insert the caller into request extensions
    req.extensions_mut().insert(AuthUser { id: user.id });

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

/// Like `require_auth`, but anonymous requests and bad tokens pass through
/// without an `AuthUser`.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = bearer_token(req.headers()).and_then(|token| state.tokens.verify(token));

    if let Some(claims) = claims {
        match state.db.get_user_by_id(claims.user_id).await {
            Ok(user) if user.is_active => {
                req.extensions_mut().insert(AuthUser { id: user.id });
            }
            Ok(_) => {}
            Err(e) => debug!("Ignoring token for unknown user: {:?}", e),
        }
    }

    next.run(req).await
}
