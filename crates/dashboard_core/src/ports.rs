//! crates/dashboard_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of a specific storage engine.

use crate::domain::{
    Achievement, Course, EnrolledCourse, Enrollment, NewUser, StudySession, TestResult, User,
    UserAchievement, UserCredentials,
};
use crate::streak::StreakState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    /// Persists name, email, avatar and preferences. Fails with `Conflict`
    /// when the new email belongs to another user.
    async fn save_user_profile(&self, user: &User) -> PortResult<User>;

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()>;

    async fn save_streak(&self, user_id: Uuid, streak: &StreakState) -> PortResult<()>;

    // --- Course Catalog ---
    async fn insert_course(&self, course: &Course) -> PortResult<()>;

    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;

    /// Adds `delta` to the course's enrollment count, never going below zero.
    async fn adjust_enrollment_count(&self, course_id: Uuid, delta: i64) -> PortResult<()>;

    // --- Enrollments ---
    /// Fails with `Conflict` when the user is already enrolled.
    async fn create_enrollment(&self, enrollment: &Enrollment) -> PortResult<()>;

    async fn get_enrollment(&self, user_id: Uuid, course_id: Uuid)
        -> PortResult<Option<Enrollment>>;

    async fn list_enrolled_courses(&self, user_id: Uuid) -> PortResult<Vec<EnrolledCourse>>;

    async fn save_enrollment(&self, enrollment: &Enrollment) -> PortResult<()>;

    /// Returns whether a row was removed.
    async fn delete_enrollment(&self, user_id: Uuid, course_id: Uuid) -> PortResult<bool>;

    // --- Achievements ---
    async fn insert_achievement(&self, achievement: &Achievement) -> PortResult<()>;

    async fn list_achievements(&self) -> PortResult<Vec<Achievement>>;

    async fn list_user_achievements(&self, user_id: Uuid) -> PortResult<Vec<UserAchievement>>;

    /// Inserts or replaces the row for `(user_id, achievement_id)`.
    async fn save_user_achievement(&self, user_achievement: &UserAchievement) -> PortResult<()>;

    // --- Study Sessions and Test Results ---
    async fn insert_study_session(&self, session: &StudySession) -> PortResult<()>;

    /// Newest first.
    async fn list_study_sessions(&self, user_id: Uuid) -> PortResult<Vec<StudySession>>;

    async fn insert_test_result(&self, result: &TestResult) -> PortResult<()>;

    /// Newest first.
    async fn list_test_results(&self, user_id: Uuid) -> PortResult<Vec<TestResult>>;
}
