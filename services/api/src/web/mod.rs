//! services/api/src/web/mod.rs
//!
//! HTTP surface: handlers, middleware, and the router that ties them together.

pub mod auth;
pub mod courses;
pub mod health;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod state;
pub mod user;
pub mod validation;

pub use middleware::{optional_auth, require_auth};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use rest::ApiDoc;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}

/// Builds the complete application router.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route("/login", post(auth::login_handler))
        .route("/register", post(auth::register_handler))
        .route("/logout", post(auth::logout_handler));

    // Catalog routes see the caller when a valid token is present
    let catalog_routes = Router::new()
        .route("/", get(courses::list_courses_handler))
        .route("/{id}", get(courses::get_course_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            optional_auth,
        ));

    // Protected routes (auth required)
    let enrollment_routes = Router::new()
        .route("/enrolled/me", get(courses::enrolled_courses_handler))
        .route("/{id}/enroll", post(courses::enroll_handler))
        .route("/{id}/unenroll", delete(courses::unenroll_handler))
        .route("/{id}/progress", put(courses::update_progress_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let user_routes = Router::new()
        .route(
            "/profile",
            get(user::get_profile_handler).put(user::update_profile_handler),
        )
        .route("/dashboard", get(user::dashboard_handler))
        .route("/achievements", get(user::achievements_handler))
        .route("/study-stats", get(user::study_stats_handler))
        .route(
            "/study-sessions",
            get(user::list_study_sessions_handler).post(user::log_study_session_handler),
        )
        .route("/test-results", post(user::log_test_result_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .nest("/api/auth", auth_routes)
        .nest("/api/courses", catalog_routes.merge(enrollment_routes))
        .nest("/api/user", user_routes)
        .fallback(health::fallback_handler)
        .method_not_allowed_fallback(health::fallback_handler)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
