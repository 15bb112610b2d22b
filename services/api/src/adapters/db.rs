//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashboard_core::domain::{
    Achievement, Course, EnrolledCourse, Enrollment, NewUser, Preferences, StudySession,
    TestResult, User, UserAchievement, UserCredentials,
};
use dashboard_core::ports::{DatabaseService, PortError, PortResult};
use dashboard_core::streak::StreakState;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url`, creating the database file if needed.
    ///
    /// In-memory databases live only as long as their connection, so they get a
    /// single connection that is never recycled.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };
        Ok(Self::new(pool))
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Deletes every row, children first. Used by the seeder.
    pub async fn reset(&self) -> Result<(), sqlx::Error> {
        for table in [
            "test_results",
            "study_sessions",
            "user_achievements",
            "achievements",
            "enrollments",
            "courses",
            "users",
        ] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps unique-constraint violations to `Conflict`.
fn conflict_or_unexpected(what: &'static str) -> impl Fn(sqlx::Error) -> PortError {
    move |e| {
        if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
            PortError::Conflict(what.to_string())
        } else {
            unexpected(e)
        }
    }
}

fn not_found_or_unexpected(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        other => unexpected(other),
    }
}

fn parse<T: FromStr>(value: &str) -> PortResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| PortError::Unexpected(format!("corrupt row: {e}")))
}

/// SQLite integers are i64; counters are never negative.
fn count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    password: String,
    avatar: Option<String>,
    is_active: bool,
    current_streak: i64,
    longest_streak: i64,
    total_study_days: i64,
    last_study_date: Option<NaiveDate>,
    preferences: Json<Preferences>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            avatar: self.avatar,
            is_active: self.is_active,
            current_streak: count(self.current_streak),
            longest_streak: count(self.longest_streak),
            total_study_days: count(self.total_study_days),
            last_study_date: self.last_study_date,
            preferences: self.preferences.0,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn to_credentials(mut self) -> UserCredentials {
        let password_hash = std::mem::take(&mut self.password);
        UserCredentials {
            user: self.to_domain(),
            password_hash,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password, avatar, is_active, current_streak, \
    longest_streak, total_study_days, last_study_date, preferences, last_login_at, created_at, updated_at";

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    title: String,
    description: String,
    instructor: String,
    instructor_avatar: Option<String>,
    category: String,
    level: String,
    duration: String,
    total_lessons: i64,
    total_tests: i64,
    rating: f64,
    review_count: i64,
    price: f64,
    original_price: Option<f64>,
    image: Option<String>,
    tags: Json<Vec<String>>,
    enrollment_count: i64,
    is_popular: bool,
    is_new: bool,
    prerequisites: Json<Vec<String>>,
    learning_outcomes: Json<Vec<String>>,
    syllabus: Json<Vec<serde_json::Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> PortResult<Course> {
        Ok(Course {
            id: self.id,
            title: self.title,
            description: self.description,
            instructor: self.instructor,
            instructor_avatar: self.instructor_avatar,
            category: self.category,
            level: parse(&self.level)?,
            duration: self.duration,
            total_lessons: count(self.total_lessons),
            total_tests: count(self.total_tests),
            rating: self.rating,
            review_count: count(self.review_count),
            price: self.price,
            original_price: self.original_price,
            image: self.image,
            tags: self.tags.0,
            enrollment_count: count(self.enrollment_count),
            is_popular: self.is_popular,
            is_new: self.is_new,
            prerequisites: self.prerequisites.0,
            learning_outcomes: self.learning_outcomes.0,
            syllabus: self.syllabus.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const COURSE_COLUMNS: &str = "c.id, c.title, c.description, c.instructor, c.instructor_avatar, \
    c.category, c.level, c.duration, c.total_lessons, c.total_tests, c.rating, c.review_count, \
    c.price, c.original_price, c.image, c.tags, c.enrollment_count, c.is_popular, c.is_new, \
    c.prerequisites, c.learning_outcomes, c.syllabus, c.created_at, c.updated_at";

#[derive(FromRow)]
struct EnrollmentRecord {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
    progress: f64,
    completed_lessons: i64,
    last_accessed_at: DateTime<Utc>,
    current_lesson: Option<String>,
    time_spent: f64,
    certificate_earned: bool,
}
impl EnrollmentRecord {
    fn to_domain(self) -> Enrollment {
        Enrollment {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            enrolled_at: self.enrolled_at,
            progress: self.progress,
            completed_lessons: count(self.completed_lessons),
            last_accessed_at: self.last_accessed_at,
            current_lesson: self.current_lesson,
            time_spent: self.time_spent,
            certificate_earned: self.certificate_earned,
        }
    }
}

const ENROLLMENT_COLUMNS: &str = "e.id AS enrollment_id, e.user_id, e.course_id, e.enrolled_at, \
    e.progress, e.completed_lessons, e.last_accessed_at, e.current_lesson, e.time_spent, \
    e.certificate_earned";

/// A course joined with one enrollment row.
#[derive(FromRow)]
struct EnrolledCourseRecord {
    #[sqlx(flatten)]
    course: CourseRecord,
    enrollment_id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
    progress: f64,
    completed_lessons: i64,
    last_accessed_at: DateTime<Utc>,
    current_lesson: Option<String>,
    time_spent: f64,
    certificate_earned: bool,
}
impl EnrolledCourseRecord {
    fn to_domain(self) -> PortResult<EnrolledCourse> {
        let enrollment = EnrollmentRecord {
            id: self.enrollment_id,
            user_id: self.user_id,
            course_id: self.course_id,
            enrolled_at: self.enrolled_at,
            progress: self.progress,
            completed_lessons: self.completed_lessons,
            last_accessed_at: self.last_accessed_at,
            current_lesson: self.current_lesson,
            time_spent: self.time_spent,
            certificate_earned: self.certificate_earned,
        }
        .to_domain();
        Ok(EnrolledCourse::new(self.course.to_domain()?, &enrollment))
    }
}

#[derive(FromRow)]
struct AchievementRecord {
    id: Uuid,
    title: String,
    description: String,
    icon: String,
    category: String,
    #[sqlx(rename = "type")]
    tier: String,
    max_progress: i64,
    requirement: String,
}
impl AchievementRecord {
    fn to_domain(self) -> PortResult<Achievement> {
        Ok(Achievement {
            id: self.id,
            title: self.title,
            description: self.description,
            icon: self.icon,
            category: parse(&self.category)?,
            tier: parse(&self.tier)?,
            max_progress: count(self.max_progress),
            requirement: self.requirement,
        })
    }
}

#[derive(FromRow)]
struct UserAchievementRecord {
    id: Uuid,
    user_id: Uuid,
    achievement_id: Uuid,
    is_unlocked: bool,
    unlocked_at: Option<DateTime<Utc>>,
    progress: i64,
}
impl UserAchievementRecord {
    fn to_domain(self) -> UserAchievement {
        UserAchievement {
            id: self.id,
            user_id: self.user_id,
            achievement_id: self.achievement_id,
            is_unlocked: self.is_unlocked,
            unlocked_at: self.unlocked_at,
            progress: count(self.progress),
        }
    }
}

#[derive(FromRow)]
struct StudySessionRecord {
    id: Uuid,
    user_id: Uuid,
    subject: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    duration: f64,
    notes: Option<String>,
}
impl StudySessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            user_id: self.user_id,
            subject: self.subject,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: self.duration,
            notes: self.notes,
        }
    }
}

#[derive(FromRow)]
struct TestResultRecord {
    id: Uuid,
    user_id: Uuid,
    course_id: Option<Uuid>,
    subject_id: String,
    test_name: String,
    score: i64,
    max_score: i64,
    completed_at: DateTime<Utc>,
    difficulty: String,
}
impl TestResultRecord {
    fn to_domain(self) -> PortResult<TestResult> {
        Ok(TestResult {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            subject_id: self.subject_id,
            test_name: self.test_name,
            score: count(self.score),
            max_score: count(self.max_score),
            completed_at: self.completed_at,
            difficulty: parse(&self.difficulty)?,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            avatar: new_user.avatar,
            is_active: true,
            current_streak: new_user.current_streak,
            longest_streak: new_user.longest_streak,
            total_study_days: new_user.total_study_days,
            last_study_date: new_user.last_study_date,
            preferences: new_user.preferences,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO users (id, name, email, password, avatar, is_active, current_streak, \
             longest_streak, total_study_days, last_study_date, preferences, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&new_user.password_hash)
        .bind(&user.avatar)
        .bind(user.is_active)
        .bind(i64::from(user.current_streak))
        .bind(i64::from(user.longest_streak))
        .bind(i64::from(user.total_study_days))
        .bind(user.last_study_date)
        .bind(Json(&user.preferences))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conflict_or_unexpected("email already registered"))?;

        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("User {} not found", email)))?;
        Ok(record.to_credentials())
    }

    async fn save_user_profile(&self, user: &User) -> PortResult<User> {
        let mut saved = user.clone();
        saved.updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET name = ?, email = ?, avatar = ?, preferences = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&saved.name)
        .bind(&saved.email)
        .bind(&saved.avatar)
        .bind(Json(&saved.preferences))
        .bind(saved.updated_at)
        .bind(saved.id)
        .execute(&self.pool)
        .await
        .map_err(conflict_or_unexpected("email already registered"))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user.id)));
        }
        Ok(saved)
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn save_streak(&self, user_id: Uuid, streak: &StreakState) -> PortResult<()> {
        sqlx::query(
            "UPDATE users SET current_streak = ?, longest_streak = ?, total_study_days = ?, \
             last_study_date = ?, updated_at = ? WHERE id = ?",
        )
        .bind(i64::from(streak.current))
        .bind(i64::from(streak.longest))
        .bind(i64::from(streak.total_days))
        .bind(streak.last_study_date)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_course(&self, course: &Course) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO courses (id, title, description, instructor, instructor_avatar, category, \
             level, duration, total_lessons, total_tests, rating, review_count, price, original_price, \
             image, tags, enrollment_count, is_popular, is_new, prerequisites, learning_outcomes, \
             syllabus, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(course.id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.instructor)
        .bind(&course.instructor_avatar)
        .bind(&course.category)
        .bind(course.level.as_str())
        .bind(&course.duration)
        .bind(i64::from(course.total_lessons))
        .bind(i64::from(course.total_tests))
        .bind(course.rating)
        .bind(i64::from(course.review_count))
        .bind(course.price)
        .bind(course.original_price)
        .bind(&course.image)
        .bind(Json(&course.tags))
        .bind(i64::from(course.enrollment_count))
        .bind(course.is_popular)
        .bind(course.is_new)
        .bind(Json(&course.prerequisites))
        .bind(Json(&course.learning_outcomes))
        .bind(Json(&course.syllabus))
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conflict_or_unexpected("course already exists"))?;
        Ok(())
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses c ORDER BY c.created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses c WHERE c.id = ?"
        ))
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Course {} not found", course_id)))?;
        record.to_domain()
    }

    async fn adjust_enrollment_count(&self, course_id: Uuid, delta: i64) -> PortResult<()> {
        sqlx::query("UPDATE courses SET enrollment_count = MAX(enrollment_count + ?, 0) WHERE id = ?")
            .bind(delta)
            .bind(course_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_enrollment(&self, enrollment: &Enrollment) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO enrollments (id, user_id, course_id, enrolled_at, progress, completed_lessons, \
             last_accessed_at, current_lesson, time_spent, certificate_earned) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(enrollment.id)
        .bind(enrollment.user_id)
        .bind(enrollment.course_id)
        .bind(enrollment.enrolled_at)
        .bind(enrollment.progress)
        .bind(i64::from(enrollment.completed_lessons))
        .bind(enrollment.last_accessed_at)
        .bind(&enrollment.current_lesson)
        .bind(enrollment.time_spent)
        .bind(enrollment.certificate_earned)
        .execute(&self.pool)
        .await
        .map_err(conflict_or_unexpected("already enrolled"))?;
        Ok(())
    }

    async fn get_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<Option<Enrollment>> {
        let record = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT id, user_id, course_id, enrolled_at, progress, completed_lessons, last_accessed_at, \
             current_lesson, time_spent, certificate_earned \
             FROM enrollments WHERE user_id = ? AND course_id = ?",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn list_enrolled_courses(&self, user_id: Uuid) -> PortResult<Vec<EnrolledCourse>> {
        let records = sqlx::query_as::<_, EnrolledCourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS}, {ENROLLMENT_COLUMNS} \
             FROM enrollments e JOIN courses c ON c.id = e.course_id \
             WHERE e.user_id = ? ORDER BY e.enrolled_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_enrollment(&self, enrollment: &Enrollment) -> PortResult<()> {
        sqlx::query(
            "UPDATE enrollments SET progress = ?, completed_lessons = ?, last_accessed_at = ?, \
             current_lesson = ?, time_spent = ?, certificate_earned = ? WHERE id = ?",
        )
        .bind(enrollment.progress.clamp(0.0, 100.0))
        .bind(i64::from(enrollment.completed_lessons))
        .bind(enrollment.last_accessed_at)
        .bind(&enrollment.current_lesson)
        .bind(enrollment.time_spent)
        .bind(enrollment.certificate_earned)
        .bind(enrollment.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_enrollment(&self, user_id: Uuid, course_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM enrollments WHERE user_id = ? AND course_id = ?")
            .bind(user_id)
            .bind(course_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_achievement(&self, achievement: &Achievement) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO achievements (id, title, description, icon, category, type, max_progress, \
             requirement, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(achievement.id)
        .bind(&achievement.title)
        .bind(&achievement.description)
        .bind(&achievement.icon)
        .bind(achievement.category.as_str())
        .bind(achievement.tier.as_str())
        .bind(i64::from(achievement.max_progress))
        .bind(&achievement.requirement)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conflict_or_unexpected("achievement already exists"))?;
        Ok(())
    }

    async fn list_achievements(&self) -> PortResult<Vec<Achievement>> {
        let records = sqlx::query_as::<_, AchievementRecord>(
            "SELECT id, title, description, icon, category, type, max_progress, requirement \
             FROM achievements ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_user_achievements(&self, user_id: Uuid) -> PortResult<Vec<UserAchievement>> {
        let records = sqlx::query_as::<_, UserAchievementRecord>(
            "SELECT id, user_id, achievement_id, is_unlocked, unlocked_at, progress \
             FROM user_achievements WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn save_user_achievement(&self, user_achievement: &UserAchievement) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_achievements (id, user_id, achievement_id, is_unlocked, unlocked_at, progress) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, achievement_id) DO UPDATE SET \
             is_unlocked = excluded.is_unlocked, unlocked_at = excluded.unlocked_at, progress = excluded.progress",
        )
        .bind(user_achievement.id)
        .bind(user_achievement.user_id)
        .bind(user_achievement.achievement_id)
        .bind(user_achievement.is_unlocked)
        .bind(user_achievement.unlocked_at)
        .bind(i64::from(user_achievement.progress))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_study_session(&self, session: &StudySession) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO study_sessions (id, user_id, subject, start_time, end_time, duration, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.subject)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.duration)
        .bind(&session.notes)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_study_sessions(&self, user_id: Uuid) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, StudySessionRecord>(
            "SELECT id, user_id, subject, start_time, end_time, duration, notes \
             FROM study_sessions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut sessions: Vec<StudySession> = records.into_iter().map(|r| r.to_domain()).collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    async fn insert_test_result(&self, result: &TestResult) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO test_results (id, user_id, course_id, subject_id, test_name, score, max_score, \
             completed_at, difficulty) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(result.id)
        .bind(result.user_id)
        .bind(result.course_id)
        .bind(&result.subject_id)
        .bind(&result.test_name)
        .bind(i64::from(result.score))
        .bind(i64::from(result.max_score))
        .bind(result.completed_at)
        .bind(result.difficulty.as_str())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_test_results(&self, user_id: Uuid) -> PortResult<Vec<TestResult>> {
        let records = sqlx::query_as::<_, TestResultRecord>(
            "SELECT id, user_id, course_id, subject_id, test_name, score, max_score, completed_at, difficulty \
             FROM test_results WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut results = records
            .into_iter()
            .map(|r| r.to_domain())
            .collect::<PortResult<Vec<TestResult>>>()?;
        results.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dashboard_core::domain::{AchievementCategory, AchievementTier, Difficulty, Level};

    async fn adapter() -> DbAdapter {
        let db = DbAdapter::connect("sqlite::memory:").await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Sarah Johnson".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            ..Default::default()
        }
    }

    fn course(title: &str) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            title: title.into(),
            description: "Master the fundamentals".into(),
            instructor: "Dr. Sarah Chen".into(),
            instructor_avatar: None,
            category: "Mathematics".into(),
            level: Level::Intermediate,
            duration: "12 weeks".into(),
            total_lessons: 48,
            total_tests: 6,
            rating: 4.8,
            review_count: 2847,
            price: 89.0,
            original_price: Some(129.0),
            image: None,
            tags: vec!["Calculus".into(), "STEM".into()],
            enrollment_count: 1,
            is_popular: true,
            is_new: false,
            prerequisites: vec!["Algebra II".into()],
            learning_outcomes: vec!["Understand limits".into()],
            syllabus: vec![serde_json::json!({"week": 1, "topic": "Limits"})],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn users_round_trip_and_emails_are_unique() {
        let db = adapter().await;
        let user = db.create_user(new_user("sarah@example.com")).await.unwrap();

        let loaded = db.get_user_by_id(user.id).await.unwrap();
        assert_eq!(loaded.email, "sarah@example.com");
        assert_eq!(loaded.preferences, Preferences::default());

        let creds = db.get_user_by_email("sarah@example.com").await.unwrap();
        assert_eq!(creds.password_hash, "$argon2id$fake");

        let dup = db.create_user(new_user("sarah@example.com")).await;
        assert!(matches!(dup, Err(PortError::Conflict(_))));

        assert!(matches!(
            db.get_user_by_id(Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn courses_keep_json_columns() {
        let db = adapter().await;
        let calc = course("Calculus I");
        db.insert_course(&calc).await.unwrap();

        let loaded = db.get_course(calc.id).await.unwrap();
        assert_eq!(loaded.tags, calc.tags);
        assert_eq!(loaded.syllabus, calc.syllabus);
        assert_eq!(loaded.level, Level::Intermediate);
        assert_eq!(loaded.original_price, Some(129.0));

        db.adjust_enrollment_count(calc.id, -5).await.unwrap();
        assert_eq!(db.get_course(calc.id).await.unwrap().enrollment_count, 0);
    }

    #[tokio::test]
    async fn enrollments_join_their_course_and_delete_cleanly() {
        let db = adapter().await;
        let user = db.create_user(new_user("john@example.com")).await.unwrap();
        let calc = course("Calculus I");
        db.insert_course(&calc).await.unwrap();

        let mut enrollment = Enrollment::start(user.id, calc.id, Utc::now());
        db.create_enrollment(&enrollment).await.unwrap();
        assert!(matches!(
            db.create_enrollment(&Enrollment::start(user.id, calc.id, Utc::now())).await,
            Err(PortError::Conflict(_))
        ));

        enrollment.progress = 65.0;
        enrollment.completed_lessons = 31;
        db.save_enrollment(&enrollment).await.unwrap();

        let enrolled = db.list_enrolled_courses(user.id).await.unwrap();
        assert_eq!(enrolled.len(), 1);
        assert_eq!(enrolled[0].course.title, "Calculus I");
        assert_eq!(enrolled[0].progress, 65.0);
        assert_eq!(enrolled[0].completed_lessons, 31);

        assert!(db.delete_enrollment(user.id, calc.id).await.unwrap());
        assert!(!db.delete_enrollment(user.id, calc.id).await.unwrap());
        assert!(db.get_enrollment(user.id, calc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_achievements_upsert() {
        let db = adapter().await;
        let user = db.create_user(new_user("emily@example.com")).await.unwrap();
        let badge = Achievement {
            id: Uuid::new_v4(),
            title: "Study Starter".into(),
            description: "Study for 3 days in a row".into(),
            icon: "🔥".into(),
            category: AchievementCategory::Streak,
            tier: AchievementTier::Bronze,
            max_progress: 3,
            requirement: "3 day study streak".into(),
        };
        db.insert_achievement(&badge).await.unwrap();

        let mut row = UserAchievement {
            id: Uuid::new_v4(),
            user_id: user.id,
            achievement_id: badge.id,
            is_unlocked: false,
            unlocked_at: None,
            progress: 1,
        };
        db.save_user_achievement(&row).await.unwrap();
        row.progress = 3;
        row.is_unlocked = true;
        row.unlocked_at = Some(Utc::now());
        db.save_user_achievement(&row).await.unwrap();

        let rows = db.list_user_achievements(user.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].progress, 3);
        assert!(rows[0].is_unlocked);
        assert_eq!(db.list_achievements().await.unwrap()[0].tier, AchievementTier::Bronze);
    }

    #[tokio::test]
    async fn activity_lists_are_newest_first() {
        let db = adapter().await;
        let user = db.create_user(new_user("kim@example.com")).await.unwrap();
        let now = Utc::now();
        for hours_ago in [5, 1, 3] {
            let start = now - Duration::hours(hours_ago);
            db.insert_study_session(&StudySession {
                id: Uuid::new_v4(),
                user_id: user.id,
                subject: "Physics".into(),
                start_time: start,
                end_time: Some(start + Duration::minutes(30)),
                duration: 0.5,
                notes: None,
            })
            .await
            .unwrap();
            db.insert_test_result(&TestResult {
                id: Uuid::new_v4(),
                user_id: user.id,
                course_id: None,
                subject_id: "Physics".into(),
                test_name: format!("Quiz {hours_ago}"),
                score: 80,
                max_score: 100,
                completed_at: start,
                difficulty: Difficulty::Hard,
            })
            .await
            .unwrap();
        }

        let sessions = db.list_study_sessions(user.id).await.unwrap();
        assert_eq!(sessions.len(), 3);
        assert!(sessions[0].start_time > sessions[1].start_time);

        let tests = db.list_test_results(user.id).await.unwrap();
        assert_eq!(tests[0].test_name, "Quiz 1");
        assert_eq!(tests[2].test_name, "Quiz 5");
    }

    #[tokio::test]
    async fn streak_and_profile_updates_persist() {
        let db = adapter().await;
        let mut user = db.create_user(new_user("lee@example.com")).await.unwrap();
        let other = db.create_user(new_user("taken@example.com")).await.unwrap();

        let streak = StreakState {
            current: 4,
            longest: 9,
            total_days: 30,
            last_study_date: Some(Utc::now().date_naive()),
        };
        db.save_streak(user.id, &streak).await.unwrap();

        user.name = "Lee Park".into();
        user.email = other.email.clone();
        assert!(matches!(db.save_user_profile(&user).await, Err(PortError::Conflict(_))));

        user.email = "lee.park@example.com".into();
        let saved = db.save_user_profile(&user).await.unwrap();
        assert_eq!(saved.name, "Lee Park");

        let loaded = db.get_user_by_id(user.id).await.unwrap();
        assert_eq!(loaded.email, "lee.park@example.com");
        assert_eq!(StreakState::from_user(&loaded), streak);
    }
}
