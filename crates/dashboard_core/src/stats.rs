//! crates/dashboard_core/src/stats.rs
//!
//! Study statistics derived from logged sessions, test results and
//! enrollments: the numbers behind the dashboard cards and the study-stats
//! page.

use crate::achievements::AchievementProgress;
use crate::domain::{Course, EnrolledCourse, StudySession, TestResult, User};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of entries in `recentTests`.
pub const RECENT_TEST_LIMIT: usize = 5;

/// Number of weeks in the weekly trend.
pub const TREND_WEEKS: u32 = 4;

const SUBJECT_COLORS: &[&str] = &[
    "from-blue-500 to-blue-600",
    "from-green-500 to-green-600",
    "from-purple-500 to-purple-600",
    "from-orange-500 to-orange-600",
    "from-pink-500 to-pink-600",
    "from-teal-500 to-teal-600",
];

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Monday 00:00 UTC of the week containing `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let offset = i64::from(date.weekday().num_days_from_monday());
    midnight(date - Duration::days(offset))
}

fn hours_since(sessions: &[StudySession], from: DateTime<Utc>) -> f64 {
    sessions
        .iter()
        .filter(|s| s.start_time >= from)
        .map(|s| s.duration)
        .sum()
}

//=========================================================================================
// Aggregates
//=========================================================================================

/// Study hours over four windows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub overall: f64,
    pub year_to_date: f64,
    pub month_to_date: f64,
    pub current_week: f64,
}

impl StudyStats {
    pub fn compute(sessions: &[StudySession], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        let month_start = today.with_day(1).unwrap_or(today);
        Self {
            overall: sessions.iter().map(|s| s.duration).sum(),
            year_to_date: hours_since(sessions, midnight(year_start)),
            month_to_date: hours_since(sessions, midnight(month_start)),
            current_week: hours_since(sessions, week_start(now)),
        }
    }
}

/// A subject the student is working on, derived from sessions and enrollments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub color: String,
    pub total_hours: f64,
    pub tests_completed: u32,
    pub total_tests: u32,
    pub last_activity: Option<DateTime<Utc>>,
}

fn latest(a: Option<DateTime<Utc>>, b: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(a.map_or(b, |a| a.max(b)))
}

/// One subject per distinct session subject, then per enrolled-course
/// category not already seen.
///
/// A test counts toward a subject when its `subject_id` names it or when its
/// course, looked up in `courses`, belongs to that category. The student does
/// not have to be enrolled in that course.
pub fn subjects(
    sessions: &[StudySession],
    enrolled: &[EnrolledCourse],
    tests: &[TestResult],
    courses: &[Course],
) -> Vec<Subject> {
    let mut names: Vec<&str> = Vec::new();
    let candidates = sessions
        .iter()
        .map(|s| s.subject.as_str())
        .chain(enrolled.iter().map(|c| c.course.category.as_str()));
    for name in candidates {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let category_of = |course_id: Option<Uuid>| {
        course_id.and_then(|id| {
            courses
                .iter()
                .chain(enrolled.iter().map(|c| &c.course))
                .find(|c| c.id == id)
                .map(|c| c.category.as_str())
        })
    };

    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let mut last_activity = None;
            let mut total_hours = 0.0;
            for s in sessions.iter().filter(|s| s.subject == name) {
                total_hours += s.duration;
                last_activity = latest(last_activity, s.end_time.unwrap_or(s.start_time));
            }

            let mut tests_completed = 0;
            for t in tests
                .iter()
                .filter(|t| t.subject_id == name || category_of(t.course_id) == Some(name))
            {
                tests_completed += 1;
                last_activity = latest(last_activity, t.completed_at);
            }

            let mut total_tests = 0;
            for c in enrolled.iter().filter(|c| c.course.category == name) {
                total_tests += c.course.total_tests;
                last_activity = latest(last_activity, c.last_accessed_at);
            }

            Subject {
                id: (index + 1).to_string(),
                name: name.to_string(),
                color: SUBJECT_COLORS[index % SUBJECT_COLORS.len()].to_string(),
                total_hours,
                tests_completed,
                total_tests,
                last_activity,
            }
        })
        .collect()
}

/// The latest test results, newest first.
pub fn recent_tests(tests: &[TestResult]) -> Vec<TestResult> {
    let mut sorted = tests.to_vec();
    sorted.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    sorted.truncate(RECENT_TEST_LIMIT);
    sorted
}

//=========================================================================================
// Study-stats Page
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SubjectBreakdown {
    pub subject: String,
    pub hours: f64,
    pub tests_completed: u32,
    pub total_tests: u32,
    /// Percentage of the subject's tests completed, at most 100.
    pub progress: f64,
}

impl From<&Subject> for SubjectBreakdown {
    fn from(subject: &Subject) -> Self {
        let progress = if subject.total_tests == 0 {
            0.0
        } else {
            (f64::from(subject.tests_completed) / f64::from(subject.total_tests) * 100.0).min(100.0)
        };
        Self {
            subject: subject.name.clone(),
            hours: subject.total_hours,
            tests_completed: subject.tests_completed,
            total_tests: subject.total_tests,
            progress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CourseBreakdown {
    pub title: String,
    pub progress: f64,
    pub time_spent: f64,
    pub completed_lessons: u32,
    pub total_lessons: u32,
}

impl From<&EnrolledCourse> for CourseBreakdown {
    fn from(course: &EnrolledCourse) -> Self {
        Self {
            title: course.course.title.clone(),
            progress: course.progress,
            time_spent: course.time_spent,
            completed_lessons: course.completed_lessons,
            total_lessons: course.course.total_lessons,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeeklyHours {
    pub week: String,
    pub hours: f64,
}

/// Hours per calendar week for the last `TREND_WEEKS` weeks, oldest first;
/// the last entry is the current week.
pub fn weekly_trend(sessions: &[StudySession], now: DateTime<Utc>) -> Vec<WeeklyHours> {
    let this_week = week_start(now);
    (0..TREND_WEEKS)
        .map(|i| {
            let start = this_week - Duration::weeks(i64::from(TREND_WEEKS - 1 - i));
            let end = start + Duration::weeks(1);
            let hours = sessions
                .iter()
                .filter(|s| s.start_time >= start && s.start_time < end)
                .map(|s| s.duration)
                .sum();
            WeeklyHours {
                week: format!("Week {}", i + 1),
                hours,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DetailedStudyStats {
    #[serde(flatten)]
    pub totals: StudyStats,
    pub by_subject: Vec<SubjectBreakdown>,
    pub by_course: Vec<CourseBreakdown>,
    pub weekly_trend: Vec<WeeklyHours>,
}

impl DetailedStudyStats {
    pub fn build(
        sessions: &[StudySession],
        enrolled: &[EnrolledCourse],
        tests: &[TestResult],
        courses: &[Course],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            totals: StudyStats::compute(sessions, now),
            by_subject: subjects(sessions, enrolled, tests, courses)
                .iter()
                .map(SubjectBreakdown::from)
                .collect(),
            by_course: enrolled.iter().map(CourseBreakdown::from).collect(),
            weekly_trend: weekly_trend(sessions, now),
        }
    }
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub study_stats: StudyStats,
    pub enrolled_subjects: Vec<Subject>,
    pub recent_tests: Vec<TestResult>,
    pub achievements: Vec<AchievementProgress>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_study_days: u32,
}

impl Dashboard {
    pub fn build(
        user: &User,
        sessions: &[StudySession],
        enrolled: &[EnrolledCourse],
        tests: &[TestResult],
        courses: &[Course],
        achievements: Vec<AchievementProgress>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            study_stats: StudyStats::compute(sessions, now),
            enrolled_subjects: subjects(sessions, enrolled, tests, courses),
            recent_tests: recent_tests(tests),
            achievements,
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
            total_study_days: user.total_study_days,
        }
    }
}
