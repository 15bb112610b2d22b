//! crates/dashboard_core/src/domain.rs
//!
//! Defines the core data structures for the dashboard.
//! These structs are independent of any database; they serialize to the
//! camelCase JSON shapes the API exchanges with its clients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// String-backed Enumerations
//=========================================================================================

/// Returned when a stored or submitted string is not a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: '{value}'")]
pub struct InvalidValue {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for an enum whose variants map
/// one-to-one onto fixed strings.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = InvalidValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(InvalidValue {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}
string_enum!(Theme, "theme", { Light => "light", Dark => "dark", System => "system" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}
string_enum!(Level, "level", {
    Beginner => "Beginner",
    Intermediate => "Intermediate",
    Advanced => "Advanced",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Streak,
    Milestone,
    Performance,
    Challenge,
}
string_enum!(AchievementCategory, "achievement category", {
    Streak => "streak",
    Milestone => "milestone",
    Performance => "performance",
    Challenge => "challenge",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AchievementTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}
string_enum!(AchievementTier, "achievement type", {
    Bronze => "bronze",
    Silver => "silver",
    Gold => "gold",
    Platinum => "platinum",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}
string_enum!(Difficulty, "difficulty", { Easy => "Easy", Medium => "Medium", Hard => "Hard" });

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub email_notifications: bool,
    pub study_reminders: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            study_reminders: true,
            theme: Theme::Light,
        }
    }
}

/// A partial preferences object; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub email_notifications: Option<bool>,
    pub study_reminders: Option<bool>,
    pub theme: Option<Theme>,
}

impl Preferences {
    pub fn merge(&mut self, update: &PreferencesUpdate) {
        if let Some(v) = update.email_notifications {
            self.email_notifications = v;
        }
        if let Some(v) = update.study_reminders {
            self.study_reminders = v;
        }
        if let Some(v) = update.theme {
            self.theme = v;
        }
    }
}

/// A registered student. The password hash is deliberately not part of this
/// type so it can never be serialized outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_study_days: u32,
    pub last_study_date: Option<NaiveDate>,
    pub preferences: Preferences,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// The data needed to insert a user row.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub preferences: Preferences,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_study_days: u32,
    pub last_study_date: Option<NaiveDate>,
}

//=========================================================================================
// Courses and Enrollments
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub instructor_avatar: Option<String>,
    pub category: String,
    pub level: Level,
    pub duration: String,
    pub total_lessons: u32,
    pub total_tests: u32,
    pub rating: f64,
    pub review_count: u32,
    pub price: f64,
    pub original_price: Option<f64>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub enrollment_count: u32,
    pub is_popular: bool,
    pub is_new: bool,
    pub prerequisites: Vec<String>,
    pub learning_outcomes: Vec<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Object>))]
    pub syllabus: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A course as seen by one particular viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub is_enrolled: bool,
}

/// The User×Course join row.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    /// Percentage in `[0, 100]`.
    pub progress: f64,
    pub completed_lessons: u32,
    pub last_accessed_at: DateTime<Utc>,
    pub current_lesson: Option<String>,
    /// Hours.
    pub time_spent: f64,
    pub certificate_earned: bool,
}

impl Enrollment {
    /// A fresh enrollment with no progress.
    pub fn start(user_id: Uuid, course_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            enrolled_at: now,
            progress: 0.0,
            completed_lessons: 0,
            last_accessed_at: now,
            current_lesson: None,
            time_spent: 0.0,
            certificate_earned: false,
        }
    }
}

/// A course flattened together with the caller's enrollment metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: Course,
    pub enrolled_at: DateTime<Utc>,
    pub progress: f64,
    pub completed_lessons: u32,
    pub last_accessed_at: DateTime<Utc>,
    pub current_lesson: Option<String>,
    pub time_spent: f64,
    pub certificate_earned: bool,
}

impl EnrolledCourse {
    pub fn new(course: Course, enrollment: &Enrollment) -> Self {
        Self {
            course,
            enrolled_at: enrollment.enrolled_at,
            progress: enrollment.progress,
            completed_lessons: enrollment.completed_lessons,
            last_accessed_at: enrollment.last_accessed_at,
            current_lesson: enrollment.current_lesson.clone(),
            time_spent: enrollment.time_spent,
            certificate_earned: enrollment.certificate_earned,
        }
    }
}

//=========================================================================================
// Achievements
//=========================================================================================

/// A badge in the achievement catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    #[serde(rename = "type")]
    pub tier: AchievementTier,
    pub max_progress: u32,
    pub requirement: String,
}

/// The User×Achievement join row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub is_unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub progress: u32,
}

//=========================================================================================
// Study Activity
//=========================================================================================

/// A logged study interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Hours.
    pub duration: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Option<Uuid>,
    pub subject_id: String,
    pub test_name: String,
    pub score: u32,
    pub max_score: u32,
    pub completed_at: DateTime<Utc>,
    pub difficulty: Difficulty,
}

impl TestResult {
    /// True when the score is at least 90% of the maximum.
    pub fn is_high_score(&self) -> bool {
        self.max_score > 0 && u64::from(self.score) * 10 >= u64::from(self.max_score) * 9
    }
}
