//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, and logout.

use crate::error::ApiError;
use crate::security::{hash_password, verify_password};
use crate::web::response::{ApiJson, ApiResponse, ErrorBody};
use crate::web::state::AppState;
use crate::web::validation::{is_valid_email, non_empty};
use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use dashboard_core::domain::{NewUser, Preferences, User};
use dashboard_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

pub const MIN_PASSWORD_LEN: usize = 8;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Returned by both login and registration.
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
    /// Token lifetime as configured, e.g. `24h`.
    pub expires_in: String,
}

fn issue_session(state: &AppState, user: User) -> Result<AuthPayload, ApiError> {
    let token = state
        .tokens
        .issue(user.id)
        .map_err(ApiError::internal("Failed to issue token"))?;
    Ok(AuthPayload {
        user,
        token,
        expires_in: state.config.jwt_expires_in.clone(),
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthPayload),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (
        non_empty(req.email.as_deref()),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    // 1. Look the user up by email
    let creds = match state.db.get_user_by_email(&email.to_lowercase()).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(invalid()),
        Err(e) => {
            error!("Failed to get user: {:?}", e);
            return Err(ApiError::Internal("Login failed".to_string()));
        }
    };
    if !creds.user.is_active {
        return Err(invalid());
    }

    // 2. Verify the password
    let valid = verify_password(password, &creds.password_hash)
        .map_err(ApiError::internal("Authentication error"))?;
    if !valid {
        return Err(invalid());
    }

    // 3. Record the login and issue a token
    let mut user = creds.user;
    let now = Utc::now();
    state.db.record_login(user.id, now).await?;
    user.last_login_at = Some(now);

    info!("User {} logged in", user.id);
    Ok(ApiResponse::ok(issue_session(&state, user)?).with_message("Login successful"))
}

/// POST /api/auth/register - Create a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthPayload),
        (status = 400, description = "Invalid input or email already registered", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        non_empty(req.name.as_deref()),
        non_empty(req.email.as_deref()),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Name, email, and password are required".to_string(),
        ));
    };

    // 1. Validate input
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let email = email.to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    // 2. Hash the password
    let password_hash =
        hash_password(password).map_err(ApiError::internal("Failed to hash password"))?;

    // 3. Create the user
    let new_user = NewUser {
        name: name.to_string(),
        email,
        password_hash,
        preferences: Preferences::default(),
        ..Default::default()
    };
    let user = match state.db.create_user(new_user).await {
        Ok(user) => user,
        Err(PortError::Conflict(_)) => {
            return Err(ApiError::BadRequest(
                "User with this email already exists".to_string(),
            ))
        }
        Err(e) => {
            error!("Failed to create user: {:?}", e);
            return Err(ApiError::Internal("Registration failed".to_string()));
        }
    };

    info!("Registered user {}", user.id);
    Ok(ApiResponse::created(
        issue_session(&state, user)?,
        "Registration successful",
    ))
}

/// POST /api/auth/logout - Logout
///
/// Tokens are stateless, so there is nothing to revoke server side; clients
/// drop their copy.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful")
    )
)]
pub async fn logout_handler() -> impl IntoResponse {
    ApiResponse::empty("Logout successful")
}
