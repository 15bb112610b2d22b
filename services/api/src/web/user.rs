//! services/api/src/web/user.rs
//!
//! Endpoints for the signed-in student: profile, dashboard, achievements,
//! study statistics, and activity logging.

use crate::error::ApiError;
use crate::web::response::{ApiJson, ApiResponse, ErrorBody};
use crate::web::state::{AppState, AuthUser};
use crate::web::validation::{is_valid_email, non_empty};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension,
};
use chrono::{DateTime, Utc};
use dashboard_core::achievements::{merge_progress, refresh_all, AchievementListing, ActivityMetrics};
use dashboard_core::domain::{Difficulty, PreferencesUpdate, StudySession, TestResult, User};
use dashboard_core::ports::PortError;
use dashboard_core::stats::{Dashboard, DetailedStudyStats};
use dashboard_core::streak::StreakState;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub preferences: Option<PreferencesUpdate>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AchievementQuery {
    /// `streak`, `milestone`, `performance`, `challenge` or `all`.
    pub category: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionRequest {
    pub subject: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Hours. Defaults to the span between start and end.
    pub duration: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestResultRequest {
    pub course_id: Option<Uuid>,
    pub subject_id: Option<String>,
    pub test_name: Option<String>,
    pub score: Option<i64>,
    pub max_score: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub difficulty: Option<Difficulty>,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    match state.db.get_user_by_id(user_id).await {
        Ok(user) => Ok(user),
        Err(PortError::NotFound(_)) => Err(ApiError::NotFound("User not found".to_string())),
        Err(e) => Err(ApiError::Port(e)),
    }
}

/// Re-measures the caller's activity and persists any achievement progress.
async fn refresh_achievements(state: &AppState, user_id: Uuid) -> Result<(), ApiError> {
    let user = load_user(state, user_id).await?;
    let sessions = state.db.list_study_sessions(user_id).await?;
    let tests = state.db.list_test_results(user_id).await?;
    let catalog = state.db.list_achievements().await?;
    let rows = state.db.list_user_achievements(user_id).await?;

    let metrics = ActivityMetrics::collect(&user, &sessions, &tests);
    for row in refresh_all(&catalog, &rows, &metrics, user_id, Utc::now()) {
        if row.is_unlocked && !rows.iter().any(|r| r.achievement_id == row.achievement_id && r.is_unlocked) {
            info!("User {} unlocked achievement {}", user_id, row.achievement_id);
        }
        state.db.save_user_achievement(&row).await?;
    }
    Ok(())
}

//=========================================================================================
// Profile
//=========================================================================================

/// GET /api/user/profile - The caller's profile
#[utoipa::path(
    get,
    path = "/api/user/profile",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The profile", body = User),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(ApiResponse::ok(load_user(&state, auth.id).await?))
}

/// PUT /api/user/profile - Edit name, email, avatar or preferences
#[utoipa::path(
    put,
    path = "/api/user/profile",
    tag = "user",
    request_body = UpdateProfileRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile updated successfully", body = User),
        (status = 400, description = "Invalid or taken email", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = load_user(&state, auth.id).await?;

    if let Some(name) = non_empty(req.name.as_deref()) {
        user.name = name.to_string();
    }
    if let Some(email) = non_empty(req.email.as_deref()) {
        let email = email.to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::BadRequest("Invalid email format".to_string()));
        }
        user.email = email;
    }
    if let Some(avatar) = non_empty(req.avatar.as_deref()) {
        user.avatar = Some(avatar.to_string());
    }
    if let Some(preferences) = &req.preferences {
        user.preferences.merge(preferences);
    }

    let saved = match state.db.save_user_profile(&user).await {
        Ok(saved) => saved,
        Err(PortError::Conflict(_)) => {
            return Err(ApiError::BadRequest("Email is already in use".to_string()))
        }
        Err(PortError::NotFound(_)) => return Err(ApiError::NotFound("User not found".to_string())),
        Err(e) => return Err(ApiError::Port(e)),
    };

    Ok(ApiResponse::ok(saved).with_message("Profile updated successfully"))
}

//=========================================================================================
// Dashboard, Achievements, Statistics
//=========================================================================================

/// GET /api/user/dashboard - Everything the home screen shows
#[utoipa::path(
    get,
    path = "/api/user/dashboard",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Dashboard data", body = Dashboard),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_user(&state, auth.id).await?;
    let sessions = state.db.list_study_sessions(user.id).await?;
    let enrolled = state.db.list_enrolled_courses(user.id).await?;
    let tests = state.db.list_test_results(user.id).await?;
    let courses = state.db.list_courses().await?;
    let catalog = state.db.list_achievements().await?;
    let rows = state.db.list_user_achievements(user.id).await?;

    let dashboard = Dashboard::build(
        &user,
        &sessions,
        &enrolled,
        &tests,
        &courses,
        merge_progress(&catalog, &rows),
        Utc::now(),
    );
    Ok(ApiResponse::ok(dashboard))
}

/// GET /api/user/achievements - The badge catalog with the caller's progress
#[utoipa::path(
    get,
    path = "/api/user/achievements",
    tag = "user",
    params(AchievementQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Achievements and summary counts", body = AchievementListing)
    )
)]
pub async fn achievements_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<AchievementQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let catalog = state
        .db
        .list_achievements()
        .await
        .map_err(ApiError::internal("Failed to fetch achievements"))?;
    let rows = state.db.list_user_achievements(auth.id).await?;

    let listing = AchievementListing::build(merge_progress(&catalog, &rows), query.category.as_deref());
    Ok(ApiResponse::ok(listing))
}

/// GET /api/user/study-stats - Detailed study statistics
#[utoipa::path(
    get,
    path = "/api/user/study-stats",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Study statistics", body = DetailedStudyStats)
    )
)]
pub async fn study_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state.db.list_study_sessions(auth.id).await?;
    let enrolled = state.db.list_enrolled_courses(auth.id).await?;
    let tests = state.db.list_test_results(auth.id).await?;
    let courses = state.db.list_courses().await?;

    Ok(ApiResponse::ok(DetailedStudyStats::build(
        &sessions,
        &enrolled,
        &tests,
        &courses,
        Utc::now(),
    )))
}

//=========================================================================================
// Activity Logging
//=========================================================================================

/// POST /api/user/study-sessions - Log a study session
#[utoipa::path(
    post,
    path = "/api/user/study-sessions",
    tag = "user",
    request_body = StudySessionRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Study session logged", body = StudySession),
        (status = 400, description = "Invalid session", body = ErrorBody)
    )
)]
pub async fn log_study_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<StudySessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(subject), Some(start_time)) = (non_empty(req.subject.as_deref()), req.start_time) else {
        return Err(ApiError::BadRequest(
            "Subject and startTime are required".to_string(),
        ));
    };
    if req.end_time.is_some_and(|end| end < start_time) {
        return Err(ApiError::BadRequest(
            "endTime must not be before startTime".to_string(),
        ));
    }
    let duration = match (req.duration, req.end_time) {
        (Some(hours), _) => hours,
        (None, Some(end)) => (end - start_time).num_seconds() as f64 / 3600.0,
        (None, None) => 0.0,
    };
    if !duration.is_finite() || duration < 0.0 {
        return Err(ApiError::BadRequest(
            "Duration must be a non-negative number of hours".to_string(),
        ));
    }

    // 1. Was anything already logged that day?
    let user = load_user(&state, auth.id).await?;
    let day = start_time.date_naive();
    let first_that_day = !state
        .db
        .list_study_sessions(user.id)
        .await?
        .iter()
        .any(|s| s.start_time.date_naive() == day);

    // 2. Store the session
    let session = StudySession {
        id: Uuid::new_v4(),
        user_id: user.id,
        subject: subject.to_string(),
        start_time,
        end_time: req.end_time,
        duration,
        notes: non_empty(req.notes.as_deref()).map(str::to_string),
    };
    state.db.insert_study_session(&session).await?;

    // 3. Streak counters, then achievements that depend on them
    let mut streak = StreakState::from_user(&user);
    streak.record_study_day(day, first_that_day);
    state.db.save_streak(user.id, &streak).await?;
    debug!("Streak for user {} is now {:?}", user.id, streak);
    refresh_achievements(&state, user.id).await?;

    Ok(ApiResponse::created(session, "Study session logged"))
}

/// GET /api/user/study-sessions - The caller's sessions, newest first
#[utoipa::path(
    get,
    path = "/api/user/study-sessions",
    tag = "user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Study sessions", body = Vec<StudySession>)
    )
)]
pub async fn list_study_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state
        .db
        .list_study_sessions(auth.id)
        .await
        .map_err(ApiError::internal("Failed to fetch study sessions"))?;
    Ok(ApiResponse::ok(sessions))
}

/// POST /api/user/test-results - Log a test result
#[utoipa::path(
    post,
    path = "/api/user/test-results",
    tag = "user",
    request_body = TestResultRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Test result logged", body = TestResult),
        (status = 400, description = "Invalid test result", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody)
    )
)]
pub async fn log_test_result_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<TestResultRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(subject_id), Some(test_name), Some(score), Some(max_score), Some(difficulty)) = (
        non_empty(req.subject_id.as_deref()),
        non_empty(req.test_name.as_deref()),
        req.score,
        req.max_score,
        req.difficulty,
    ) else {
        return Err(ApiError::BadRequest(
            "subjectId, testName, score, maxScore and difficulty are required".to_string(),
        ));
    };

    let max_score = u32::try_from(max_score)
        .ok()
        .filter(|m| *m > 0)
        .ok_or_else(|| ApiError::BadRequest("maxScore must be positive".to_string()))?;
    let score = u32::try_from(score)
        .ok()
        .filter(|s| *s <= max_score)
        .ok_or_else(|| {
            ApiError::BadRequest("score must be between 0 and maxScore".to_string())
        })?;

    if let Some(course_id) = req.course_id {
        match state.db.get_course(course_id).await {
            Ok(_) => {}
            Err(PortError::NotFound(_)) => {
                return Err(ApiError::NotFound("Course not found".to_string()))
            }
            Err(e) => return Err(ApiError::Port(e)),
        }
    }

    let result = TestResult {
        id: Uuid::new_v4(),
        user_id: auth.id,
        course_id: req.course_id,
        subject_id: subject_id.to_string(),
        test_name: test_name.to_string(),
        score,
        max_score,
        completed_at: req.completed_at.unwrap_or_else(Utc::now),
        difficulty,
    };
    state.db.insert_test_result(&result).await?;
    refresh_achievements(&state, auth.id).await?;

    info!("User {} logged test '{}' ({}/{})", auth.id, result.test_name, score, max_score);
    Ok(ApiResponse::created(result, "Test result logged"))
}
