//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use crate::web::{auth, courses, health, response::ErrorBody, user};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::register_handler,
        auth::logout_handler,
        courses::list_courses_handler,
        courses::get_course_handler,
        courses::enrolled_courses_handler,
        courses::enroll_handler,
        courses::unenroll_handler,
        courses::update_progress_handler,
        user::get_profile_handler,
        user::update_profile_handler,
        user::dashboard_handler,
        user::achievements_handler,
        user::study_stats_handler,
        user::log_study_session_handler,
        user::list_study_sessions_handler,
        user::log_test_result_handler,
        health::health_handler,
        health::root_handler,
    ),
    components(
        schemas(ErrorBody, auth::AuthPayload)
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and logout."),
        (name = "courses", description = "Course catalog and enrollments."),
        (name = "user", description = "Profile, dashboard, achievements and study activity."),
        (name = "health", description = "Service status.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the authenticated paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
