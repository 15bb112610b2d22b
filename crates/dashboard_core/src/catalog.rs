//! crates/dashboard_core/src/catalog.rs
//!
//! Course catalog browsing and enrolled-course bookkeeping: the filters, sort
//! orders and summary statistics behind the course grids.

use crate::domain::{Course, EnrolledCourse, Enrollment, Level};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Treats absent, empty and the given "match everything" sentinel as no filter.
fn active<'a>(value: Option<&'a str>, wildcard: &str) -> Option<&'a str> {
    value.filter(|v| !v.is_empty() && *v != wildcard)
}

//=========================================================================================
// Catalog Listing
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseSort {
    #[default]
    Popular,
    Newest,
    Rating,
    PriceLow,
    PriceHigh,
}

impl CourseSort {
    /// Unknown or missing keys fall back to `Popular`.
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("newest") => Self::Newest,
            Some("rating") => Self::Rating,
            Some("price-low") => Self::PriceLow,
            Some("price-high") => Self::PriceHigh,
            _ => Self::Popular,
        }
    }

    fn compare(&self, a: &Course, b: &Course) -> Ordering {
        match self {
            Self::Popular => b.enrollment_count.cmp(&a.enrollment_count),
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Rating => b.rating.total_cmp(&a.rating),
            Self::PriceLow => a.price.total_cmp(&b.price),
            Self::PriceHigh => b.price.total_cmp(&a.price),
        }
    }
}

/// Query parameters accepted by the catalog listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct CourseQuery {
    /// Exact category, or `All`.
    pub category: Option<String>,
    /// `Beginner`, `Intermediate`, `Advanced`, or `All`.
    pub level: Option<String>,
    /// Case-insensitive match over title, description, instructor and tags.
    pub search: Option<String>,
    /// `popular` (default), `newest`, `rating`, `price-low` or `price-high`.
    pub sort: Option<String>,
}

impl CourseQuery {
    pub fn matches(&self, course: &Course) -> bool {
        if let Some(category) = active(self.category.as_deref(), "All") {
            if course.category != category {
                return false;
            }
        }
        if let Some(level) = active(self.level.as_deref(), "All") {
            if course.level.as_str() != level {
                return false;
            }
        }
        if let Some(search) = active(self.search.as_deref(), "") {
            let term = search.to_lowercase();
            let hit = course.title.to_lowercase().contains(&term)
                || course.description.to_lowercase().contains(&term)
                || course.instructor.to_lowercase().contains(&term)
                || course.tags.iter().any(|t| t.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Filters and sorts the catalog. The sort is stable.
    pub fn apply(&self, courses: &[Course]) -> Vec<Course> {
        let sort = CourseSort::parse(self.sort.as_deref());
        let mut selected: Vec<Course> = courses.iter().filter(|c| self.matches(c)).cloned().collect();
        selected.sort_by(|a, b| sort.compare(a, b));
        selected
    }
}

/// The distinct categories of `courses`, in first-seen order.
pub fn distinct_categories(courses: &[Course]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for course in courses {
        if !categories.contains(&course.category) {
            categories.push(course.category.clone());
        }
    }
    categories
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourseListing {
    pub courses: Vec<Course>,
    pub total: usize,
    pub categories: Vec<String>,
    pub levels: Vec<Level>,
}

impl CourseListing {
    /// Applies `query` to the full catalog. Categories always describe the
    /// whole catalog, not the filtered page.
    pub fn build(catalog: &[Course], query: &CourseQuery) -> Self {
        let courses = query.apply(catalog);
        Self {
            total: courses.len(),
            courses,
            categories: distinct_categories(catalog),
            levels: Level::ALL.to_vec(),
        }
    }
}

//=========================================================================================
// Enrolled Courses
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrolledFilter {
    #[default]
    All,
    InProgress,
    Completed,
    NotStarted,
}

impl EnrolledFilter {
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("in-progress") => Self::InProgress,
            Some("completed") => Self::Completed,
            Some("not-started") => Self::NotStarted,
            _ => Self::All,
        }
    }

    pub fn matches(&self, course: &EnrolledCourse) -> bool {
        match self {
            Self::All => true,
            Self::InProgress => is_in_progress(course),
            Self::Completed => is_completed(course),
            Self::NotStarted => is_not_started(course),
        }
    }
}

fn is_in_progress(course: &EnrolledCourse) -> bool {
    course.progress > 0.0 && course.progress < 100.0
}

fn is_completed(course: &EnrolledCourse) -> bool {
    course.progress >= 100.0
}

fn is_not_started(course: &EnrolledCourse) -> bool {
    course.progress <= 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrolledSort {
    #[default]
    Recent,
    Progress,
    Enrolled,
    Alphabetical,
}

impl EnrolledSort {
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("progress") => Self::Progress,
            Some("enrolled") => Self::Enrolled,
            Some("alphabetical") => Self::Alphabetical,
            _ => Self::Recent,
        }
    }

    fn compare(&self, a: &EnrolledCourse, b: &EnrolledCourse) -> Ordering {
        match self {
            Self::Recent => b.last_accessed_at.cmp(&a.last_accessed_at),
            Self::Progress => b.progress.total_cmp(&a.progress),
            Self::Enrolled => b.enrolled_at.cmp(&a.enrolled_at),
            Self::Alphabetical => a
                .course
                .title
                .to_lowercase()
                .cmp(&b.course.title.to_lowercase())
                .then_with(|| a.course.title.cmp(&b.course.title)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct EnrolledQuery {
    /// `in-progress`, `completed` or `not-started`; anything else shows all.
    pub filter: Option<String>,
    /// `recent` (default), `progress`, `enrolled` or `alphabetical`.
    pub sort: Option<String>,
}

impl EnrolledQuery {
    pub fn apply(&self, courses: &[EnrolledCourse]) -> Vec<EnrolledCourse> {
        let filter = EnrolledFilter::parse(self.filter.as_deref());
        let sort = EnrolledSort::parse(self.sort.as_deref());
        let mut selected: Vec<EnrolledCourse> =
            courses.iter().filter(|c| filter.matches(c)).cloned().collect();
        selected.sort_by(|a, b| sort.compare(a, b));
        selected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStats {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub not_started: usize,
    /// Zero when there are no enrollments.
    pub average_progress: f64,
    pub total_time_spent: f64,
    pub certificates_earned: usize,
}

impl EnrollmentStats {
    pub fn compute(courses: &[EnrolledCourse]) -> Self {
        let total = courses.len();
        let progress_sum: f64 = courses.iter().map(|c| c.progress).sum();
        Self {
            total,
            in_progress: courses.iter().filter(|c| is_in_progress(c)).count(),
            completed: courses.iter().filter(|c| is_completed(c)).count(),
            not_started: courses.iter().filter(|c| is_not_started(c)).count(),
            average_progress: if total == 0 { 0.0 } else { progress_sum / total as f64 },
            total_time_spent: courses.iter().map(|c| c.time_spent).sum(),
            certificates_earned: courses.iter().filter(|c| c.certificate_earned).count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnrolledListing {
    pub courses: Vec<EnrolledCourse>,
    pub stats: EnrollmentStats,
}

impl EnrolledListing {
    /// Stats cover every enrollment; only `courses` is filtered.
    pub fn build(enrolled: &[EnrolledCourse], query: &EnrolledQuery) -> Self {
        Self {
            courses: query.apply(enrolled),
            stats: EnrollmentStats::compute(enrolled),
        }
    }
}

//=========================================================================================
// Progress Updates
//=========================================================================================

/// A lesson-progress report for one enrollment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Absolute number of completed lessons.
    pub completed_lessons: Option<u32>,
    pub current_lesson: Option<String>,
    /// Hours to add to the time already spent.
    pub time_spent: Option<f64>,
}

impl Enrollment {
    /// Applies `update` against a course of `total_lessons` lessons.
    ///
    /// Completed lessons are clamped to the course length and progress stays
    /// within `[0, 100]`. Once earned, a certificate is never revoked.
    pub fn apply_progress(&mut self, update: &ProgressUpdate, total_lessons: u32, now: DateTime<Utc>) {
        if let Some(completed) = update.completed_lessons {
            self.completed_lessons = completed.min(total_lessons);
            self.progress = if total_lessons == 0 {
                0.0
            } else {
                (f64::from(self.completed_lessons) / f64::from(total_lessons) * 100.0).clamp(0.0, 100.0)
            };
        }
        if let Some(lesson) = &update.current_lesson {
            self.current_lesson = Some(lesson.clone());
        }
        if let Some(hours) = update.time_spent {
            self.time_spent += hours.max(0.0);
        }
        if self.progress >= 100.0 {
            self.certificate_earned = true;
        }
        self.last_accessed_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn course(title: &str, category: &str, level: Level, enrollments: u32, price: f64) -> Course {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("All about {title}"),
            instructor: "Dr. Sarah Chen".to_string(),
            instructor_avatar: None,
            category: category.to_string(),
            level,
            duration: "12 weeks".to_string(),
            total_lessons: 40,
            total_tests: 4,
            rating: 4.5,
            review_count: 10,
            price,
            original_price: None,
            image: None,
            tags: vec!["STEM".to_string()],
            enrollment_count: enrollments,
            is_popular: false,
            is_new: false,
            prerequisites: vec![],
            learning_outcomes: vec![],
            syllabus: vec![],
            created_at: created + Duration::days(i64::from(enrollments % 17)),
            updated_at: created,
        }
    }

    fn sample_catalog() -> Vec<Course> {
        vec![
            course("Calculus I", "Mathematics", Level::Intermediate, 15420, 89.0),
            course("Data Structures", "Computer Science", Level::Intermediate, 23150, 149.0),
            course("Classical Mechanics", "Physics", Level::Advanced, 8750, 119.0),
            course("Web Bootcamp", "Web Development", Level::Beginner, 45230, 299.0),
        ]
    }

    fn enrolled(title: &str, progress: f64, accessed_days_ago: i64) -> EnrolledCourse {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let base = course(title, "Mathematics", Level::Beginner, 1, 10.0);
        let mut enrollment = Enrollment::start(Uuid::new_v4(), base.id, now - Duration::days(30));
        enrollment.progress = progress;
        enrollment.last_accessed_at = now - Duration::days(accessed_days_ago);
        enrollment.time_spent = 2.5;
        enrollment.certificate_earned = progress >= 100.0;
        EnrolledCourse::new(base, &enrollment)
    }

    #[test]
    fn default_sort_is_most_popular_first() {
        let listing = CourseListing::build(&sample_catalog(), &CourseQuery::default());
        let titles: Vec<_> = listing.courses.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Web Bootcamp", "Data Structures", "Calculus I", "Classical Mechanics"]);
        assert_eq!(listing.total, 4);
        assert_eq!(listing.levels.len(), 3);
    }

    #[test]
    fn category_and_level_filters_ignore_all() {
        let catalog = sample_catalog();
        let query = CourseQuery {
            category: Some("All".into()),
            level: Some("Intermediate".into()),
            ..Default::default()
        };
        let listing = CourseListing::build(&catalog, &query);
        assert_eq!(listing.total, 2);
        // categories describe the whole catalog
        assert_eq!(listing.categories.len(), 4);
        assert_eq!(listing.categories[0], "Mathematics");
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let catalog = sample_catalog();
        let by_title = CourseQuery { search: Some("CALCULUS".into()), ..Default::default() };
        assert_eq!(by_title.apply(&catalog).len(), 1);

        let by_tag = CourseQuery { search: Some("stem".into()), ..Default::default() };
        assert_eq!(by_tag.apply(&catalog).len(), 4);

        let miss = CourseQuery { search: Some("underwater basket".into()), ..Default::default() };
        assert!(miss.apply(&catalog).is_empty());
    }

    #[test]
    fn price_sorts_both_directions() {
        let catalog = sample_catalog();
        let low = CourseQuery { sort: Some("price-low".into()), ..Default::default() }.apply(&catalog);
        assert_eq!(low.first().map(|c| c.price), Some(89.0));
        let high = CourseQuery { sort: Some("price-high".into()), ..Default::default() }.apply(&catalog);
        assert_eq!(high.first().map(|c| c.price), Some(299.0));
    }

    #[test]
    fn enrolled_filters_split_by_progress() {
        let courses = vec![
            enrolled("Algebra", 0.0, 3),
            enrolled("Geometry", 45.0, 1),
            enrolled("Statistics", 100.0, 7),
        ];
        let in_progress = EnrolledQuery { filter: Some("in-progress".into()), sort: None };
        assert_eq!(in_progress.apply(&courses).len(), 1);

        let listing = EnrolledListing::build(&courses, &EnrolledQuery {
            filter: Some("completed".into()),
            sort: None,
        });
        assert_eq!(listing.courses.len(), 1);
        assert_eq!(listing.stats.total, 3);
        assert_eq!(listing.stats.not_started, 1);
        assert_eq!(listing.stats.certificates_earned, 1);
        assert!((listing.stats.average_progress - 145.0 / 3.0).abs() < 1e-9);
        assert!((listing.stats.total_time_spent - 7.5).abs() < 1e-9);
    }

    #[test]
    fn enrolled_default_sort_is_most_recent_access() {
        let courses = vec![enrolled("b", 10.0, 5), enrolled("a", 20.0, 1), enrolled("C", 30.0, 9)];
        let recent = EnrolledQuery::default().apply(&courses);
        assert_eq!(recent[0].course.title, "a");

        let alpha = EnrolledQuery { filter: None, sort: Some("alphabetical".into()) }.apply(&courses);
        let titles: Vec<_> = alpha.iter().map(|c| c.course.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "C"]);
    }

    #[test]
    fn stats_of_nothing_are_zero() {
        let stats = EnrollmentStats::compute(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_progress, 0.0);
    }

    #[test]
    fn progress_is_clamped_and_certificate_sticks() {
        let now = Utc::now();
        let mut enrollment = Enrollment::start(Uuid::new_v4(), Uuid::new_v4(), now);
        enrollment.apply_progress(
            &ProgressUpdate { completed_lessons: Some(12), time_spent: Some(1.5), ..Default::default() },
            48,
            now,
        );
        assert_eq!(enrollment.progress, 25.0);
        assert!(!enrollment.certificate_earned);

        enrollment.apply_progress(
            &ProgressUpdate { completed_lessons: Some(500), time_spent: Some(2.0), ..Default::default() },
            48,
            now,
        );
        assert_eq!(enrollment.completed_lessons, 48);
        assert_eq!(enrollment.progress, 100.0);
        assert!(enrollment.certificate_earned);
        assert!((enrollment.time_spent - 3.5).abs() < 1e-9);

        enrollment.apply_progress(
            &ProgressUpdate { completed_lessons: Some(10), ..Default::default() },
            48,
            now,
        );
        assert!(enrollment.progress < 100.0);
        assert!(enrollment.certificate_earned);
    }
}
