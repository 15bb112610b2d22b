//! services/api/src/web/courses.rs
//!
//! Course catalog, enrollment and lesson-progress endpoints.

use crate::error::ApiError;
use crate::web::response::{ApiJson, ApiResponse, ErrorBody};
use crate::web::state::{AppState, AuthUser};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension,
};
use chrono::Utc;
use dashboard_core::catalog::{CourseListing, CourseQuery, EnrolledListing, EnrolledQuery, ProgressUpdate};
use dashboard_core::domain::{Course, CourseDetail, EnrolledCourse, Enrollment};
use dashboard_core::ports::PortError;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

fn course_not_found() -> ApiError {
    ApiError::NotFound("Course not found".to_string())
}

fn enrollment_not_found() -> ApiError {
    ApiError::NotFound("Enrollment not found".to_string())
}

/// Loads a course by its path id. Malformed ids are reported like unknown ones.
async fn load_course(state: &AppState, raw_id: &str) -> Result<Course, ApiError> {
    let course_id = Uuid::parse_str(raw_id).map_err(|_| course_not_found())?;
    match state.db.get_course(course_id).await {
        Ok(course) => Ok(course),
        Err(PortError::NotFound(_)) => Err(course_not_found()),
        Err(e) => Err(ApiError::Port(e)),
    }
}

//=========================================================================================
// Catalog
//=========================================================================================

/// GET /api/courses - List the catalog with optional filters
#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "courses",
    params(CourseQuery),
    responses(
        (status = 200, description = "Filtered and sorted catalog", body = CourseListing)
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CourseQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let catalog = state
        .db
        .list_courses()
        .await
        .map_err(ApiError::internal("Failed to fetch courses"))?;
    Ok(ApiResponse::ok(CourseListing::build(&catalog, &query)))
}

/// GET /api/courses/{id} - One course, with the caller's enrollment flag
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course", body = CourseDetail),
        (status = 404, description = "Course not found", body = ErrorBody)
    )
)]
pub async fn get_course_handler(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let course = load_course(&state, &id).await?;

    let is_enrolled = match auth {
        Some(Extension(user)) => state.db.get_enrollment(user.id, course.id).await?.is_some(),
        None => false,
    };

    Ok(ApiResponse::ok(CourseDetail { course, is_enrolled }))
}

//=========================================================================================
// Enrollments
//=========================================================================================

/// GET /api/courses/enrolled/me - The caller's enrolled courses and stats
#[utoipa::path(
    get,
    path = "/api/courses/enrolled/me",
    tag = "courses",
    params(EnrolledQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Enrolled courses", body = EnrolledListing),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn enrolled_courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<EnrolledQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let enrolled = state
        .db
        .list_enrolled_courses(user.id)
        .await
        .map_err(ApiError::internal("Failed to fetch enrolled courses"))?;
    Ok(ApiResponse::ok(EnrolledListing::build(&enrolled, &query)))
}

/// POST /api/courses/{id}/enroll - Enroll the caller in a course
#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Successfully enrolled in course", body = EnrolledCourse),
        (status = 400, description = "Already enrolled in this course", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody)
    )
)]
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut course = load_course(&state, &id).await?;
    let already = || ApiError::BadRequest("Already enrolled in this course".to_string());

    if state.db.get_enrollment(user.id, course.id).await?.is_some() {
        return Err(already());
    }

    let enrollment = Enrollment::start(user.id, course.id, Utc::now());
    match state.db.create_enrollment(&enrollment).await {
        Ok(()) => {}
        // Lost a race with a concurrent request for the same pair.
        Err(PortError::Conflict(_)) => return Err(already()),
        Err(e) => return Err(ApiError::Port(e)),
    }
    state.db.adjust_enrollment_count(course.id, 1).await?;
    course.enrollment_count += 1;

    info!("User {} enrolled in course {}", user.id, course.id);
    Ok(ApiResponse::created(
        EnrolledCourse::new(course, &enrollment),
        "Successfully enrolled in course",
    ))
}

/// DELETE /api/courses/{id}/unenroll - Drop an enrollment
#[utoipa::path(
    delete,
    path = "/api/courses/{id}/unenroll",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Successfully unenrolled from course"),
        (status = 404, description = "Enrollment not found", body = ErrorBody)
    )
)]
pub async fn unenroll_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = Uuid::parse_str(&id).map_err(|_| enrollment_not_found())?;

    if !state.db.delete_enrollment(user.id, course_id).await? {
        return Err(enrollment_not_found());
    }
    state.db.adjust_enrollment_count(course_id, -1).await?;

    info!("User {} unenrolled from course {}", user.id, course_id);
    Ok(ApiResponse::empty("Successfully unenrolled from course"))
}

/// PUT /api/courses/{id}/progress - Report lesson progress
#[utoipa::path(
    put,
    path = "/api/courses/{id}/progress",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = ProgressUpdate,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Progress updated", body = EnrolledCourse),
        (status = 400, description = "Invalid progress values", body = ErrorBody),
        (status = 404, description = "Enrollment not found", body = ErrorBody)
    )
)]
pub async fn update_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProgressUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if update.time_spent.is_some_and(|h| !h.is_finite() || h < 0.0) {
        return Err(ApiError::BadRequest(
            "timeSpent must be a non-negative number of hours".to_string(),
        ));
    }

    let course = load_course(&state, &id).await?;
    let mut enrollment = state
        .db
        .get_enrollment(user.id, course.id)
        .await?
        .ok_or_else(enrollment_not_found)?;

    enrollment.apply_progress(&update, course.total_lessons, Utc::now());
    state.db.save_enrollment(&enrollment).await?;

    Ok(ApiResponse::ok(EnrolledCourse::new(course, &enrollment)).with_message("Progress updated"))
}
