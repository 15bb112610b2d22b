//! services/api/src/seed.rs
//!
//! Demo data: three students, a five-course catalog, enrollments, the badge
//! catalog, and a little recent activity for the first student.

use crate::adapters::DbAdapter;
use crate::error::ApiError;
use crate::security::hash_password;
use chrono::{DateTime, Duration, Utc};
use dashboard_core::domain::{
    Achievement, AchievementCategory, AchievementTier, Course, Difficulty, Enrollment, Level,
    NewUser, Preferences, StudySession, TestResult, Theme, User, UserAchievement,
};
use dashboard_core::ports::DatabaseService;
use tracing::info;
use uuid::Uuid;

/// Every seeded account uses this password.
pub const DEMO_PASSWORD: &str = "password123";

/// Row counts written by `seed`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub courses: usize,
    pub enrollments: usize,
    pub achievements: usize,
    pub user_achievements: usize,
    pub study_sessions: usize,
    pub test_results: usize,
}

struct CourseSeed {
    title: &'static str,
    description: &'static str,
    instructor: &'static str,
    instructor_avatar: &'static str,
    category: &'static str,
    level: Level,
    duration: &'static str,
    total_lessons: u32,
    total_tests: u32,
    rating: f64,
    review_count: u32,
    price: f64,
    original_price: Option<f64>,
    image: &'static str,
    tags: &'static [&'static str],
    enrollment_count: u32,
    is_popular: bool,
    is_new: bool,
    prerequisites: &'static [&'static str],
    learning_outcomes: &'static [&'static str],
}

impl CourseSeed {
    fn into_course(self, created_at: DateTime<Utc>) -> Course {
        let strings = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Course {
            id: Uuid::new_v4(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            instructor: self.instructor.to_string(),
            instructor_avatar: Some(self.instructor_avatar.to_string()),
            category: self.category.to_string(),
            level: self.level,
            duration: self.duration.to_string(),
            total_lessons: self.total_lessons,
            total_tests: self.total_tests,
            rating: self.rating,
            review_count: self.review_count,
            price: self.price,
            original_price: self.original_price,
            image: Some(self.image.to_string()),
            tags: strings(self.tags),
            enrollment_count: self.enrollment_count,
            is_popular: self.is_popular,
            is_new: self.is_new,
            prerequisites: strings(self.prerequisites),
            learning_outcomes: strings(self.learning_outcomes),
            syllabus: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }
}

fn catalog() -> Vec<CourseSeed> {
    vec![
        CourseSeed {
            title: "Calculus I: Limits, Derivatives, and Applications",
            description: "Master the fundamentals of calculus including limits, derivatives, and their real-world applications.",
            instructor: "Dr. Sarah Chen",
            instructor_avatar: "https://images.unsplash.com/photo-1494790108755-2616b612b786",
            category: "Mathematics",
            level: Level::Intermediate,
            duration: "12 weeks",
            total_lessons: 48,
            total_tests: 6,
            rating: 4.8,
            review_count: 2847,
            price: 89.0,
            original_price: Some(129.0),
            image: "https://images.unsplash.com/photo-1635070041078-e363dbe005cb",
            tags: &["Mathematics", "Calculus", "STEM"],
            enrollment_count: 15420,
            is_popular: true,
            is_new: false,
            prerequisites: &["Algebra II", "Trigonometry"],
            learning_outcomes: &[
                "Understand limits and continuity",
                "Master differentiation techniques",
                "Apply derivatives to real-world problems",
            ],
        },
        CourseSeed {
            title: "Data Structures & Algorithms Masterclass",
            description: "Comprehensive course covering essential data structures and algorithms.",
            instructor: "Prof. Michael Rodriguez",
            instructor_avatar: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e",
            category: "Computer Science",
            level: Level::Intermediate,
            duration: "16 weeks",
            total_lessons: 64,
            total_tests: 8,
            rating: 4.9,
            review_count: 4521,
            price: 149.0,
            original_price: Some(199.0),
            image: "https://images.unsplash.com/photo-1517077304055-6e89abbf09b0",
            tags: &["Programming", "Algorithms", "Data Structures"],
            enrollment_count: 23150,
            is_popular: true,
            is_new: false,
            prerequisites: &["Basic Programming"],
            learning_outcomes: &[
                "Master fundamental data structures",
                "Implement sorting algorithms",
                "Analyze complexity",
            ],
        },
        CourseSeed {
            title: "Physics: Classical Mechanics",
            description: "Explore the fundamental principles of classical mechanics.",
            instructor: "Dr. Elena Vasquez",
            instructor_avatar: "https://images.unsplash.com/photo-1580489944761-15a19d654956",
            category: "Physics",
            level: Level::Advanced,
            duration: "14 weeks",
            total_lessons: 42,
            total_tests: 7,
            rating: 4.7,
            review_count: 1893,
            price: 119.0,
            original_price: None,
            image: "https://images.unsplash.com/photo-1614935151651-0bea6508db6b",
            tags: &["Physics", "Mechanics", "Mathematical Physics"],
            enrollment_count: 8750,
            is_popular: false,
            is_new: false,
            prerequisites: &["Calculus I", "Vector Algebra"],
            learning_outcomes: &[
                "Understand Newtonian mechanics",
                "Apply conservation laws",
                "Master rotational dynamics",
            ],
        },
        CourseSeed {
            title: "Web Development Bootcamp",
            description: "Complete web development course covering HTML, CSS, JavaScript, React, and Node.js.",
            instructor: "Alex Thompson",
            instructor_avatar: "https://images.unsplash.com/photo-1560250097-0b93528c311a",
            category: "Web Development",
            level: Level::Beginner,
            duration: "20 weeks",
            total_lessons: 80,
            total_tests: 10,
            rating: 4.9,
            review_count: 8921,
            price: 299.0,
            original_price: Some(399.0),
            image: "https://images.unsplash.com/photo-1461749280684-dccba630e2f6",
            tags: &["Web Development", "JavaScript", "React", "Node.js"],
            enrollment_count: 45230,
            is_popular: true,
            is_new: true,
            prerequisites: &[],
            learning_outcomes: &[
                "Build responsive web applications",
                "Master modern JavaScript frameworks",
                "Develop backend APIs",
            ],
        },
        CourseSeed {
            title: "Machine Learning Engineering",
            description: "Advanced machine learning course covering supervised and unsupervised learning.",
            instructor: "Dr. Raj Patel",
            instructor_avatar: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e",
            category: "Artificial Intelligence",
            level: Level::Advanced,
            duration: "18 weeks",
            total_lessons: 72,
            total_tests: 9,
            rating: 4.8,
            review_count: 2134,
            price: 249.0,
            original_price: Some(349.0),
            image: "https://images.unsplash.com/photo-1620712943543-bcc4688e7485",
            tags: &["Machine Learning", "AI", "Python", "Deep Learning"],
            enrollment_count: 9876,
            is_popular: true,
            is_new: false,
            prerequisites: &["Statistics", "Linear Algebra", "Python Programming"],
            learning_outcomes: &[
                "Implement ML algorithms from scratch",
                "Build and deploy ML models",
                "Master deep learning techniques",
            ],
        },
    ]
}

fn badges() -> Vec<Achievement> {
    let badge = |title: &str,
                 description: &str,
                 icon: &str,
                 category: AchievementCategory,
                 tier: AchievementTier,
                 max_progress: u32,
                 requirement: &str| Achievement {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        category,
        tier,
        max_progress,
        requirement: requirement.to_string(),
    };
    vec![
        badge("Study Starter", "Study for 3 days in a row", "🔥", AchievementCategory::Streak, AchievementTier::Bronze, 3, "3 day study streak"),
        badge("Week Warrior", "Complete a perfect 7-day study streak", "⚡", AchievementCategory::Streak, AchievementTier::Silver, 7, "7 day study streak"),
        badge("Monthly Master", "Achieve a 30-day study streak", "💎", AchievementCategory::Streak, AchievementTier::Gold, 30, "30 day study streak"),
        badge("First Sprint", "Complete 50 hours of study time", "🎯", AchievementCategory::Milestone, AchievementTier::Bronze, 50, "50 study hours"),
        badge("Test Ace", "Score 90%+ on 5 tests", "🎖️", AchievementCategory::Performance, AchievementTier::Gold, 5, "5 tests with 90%+"),
    ]
}

async fn create_student(
    db: &DbAdapter,
    password_hash: &str,
    name: &str,
    email: &str,
    avatar: Option<&str>,
    streak: (u32, u32, u32),
    preferences: Preferences,
) -> Result<User, ApiError> {
    let (current_streak, longest_streak, total_study_days) = streak;
    let user = db
        .create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            avatar: avatar.map(str::to_string),
            preferences,
            current_streak,
            longest_streak,
            total_study_days,
            last_study_date: Some(Utc::now().date_naive()),
        })
        .await?;
    Ok(user)
}

/// Wipes the database and writes the demo data set.
pub async fn seed(db: &DbAdapter) -> Result<SeedSummary, ApiError> {
    let now = Utc::now();
    let mut summary = SeedSummary::default();

    db.reset().await?;
    info!("Database reset complete");

    // --- Users ---
    let password_hash =
        hash_password(DEMO_PASSWORD).map_err(ApiError::internal("Failed to hash password"))?;
    let sarah = create_student(
        db,
        &password_hash,
        "Sarah Johnson",
        "sarah.johnson@email.com",
        Some("https://images.unsplash.com/photo-1494790108755-2616b612b786"),
        (12, 15, 89),
        Preferences::default(),
    )
    .await?;
    let john = create_student(
        db,
        &password_hash,
        "John Doe",
        "john.doe@email.com",
        None,
        (5, 10, 45),
        Preferences {
            email_notifications: false,
            study_reminders: true,
            theme: Theme::Dark,
        },
    )
    .await?;
    let emily = create_student(
        db,
        &password_hash,
        "Emily Chen",
        "emily.chen@email.com",
        None,
        (8, 20, 120),
        Preferences {
            email_notifications: true,
            study_reminders: false,
            theme: Theme::Light,
        },
    )
    .await?;
    summary.users = 3;

    // --- Courses (oldest first so "newest" sorting has something to show) ---
    let seeds = catalog();
    let count = seeds.len() as i64;
    let mut courses = Vec::new();
    for (i, seed) in seeds.into_iter().enumerate() {
        let course = seed.into_course(now - Duration::days(count - i as i64));
        db.insert_course(&course).await?;
        courses.push(course);
    }
    summary.courses = courses.len();

    // --- Enrollments ---
    let plan = [
        (&sarah, 0, 65.0, 31, "Differentiation Rules", 85.5),
        (&sarah, 1, 45.0, 29, "Linked List Basics", 67.25),
        (&john, 3, 30.0, 24, "React Components", 45.0),
        (&emily, 4, 78.0, 56, "Neural Networks", 120.5),
    ];
    for (user, course_index, progress, completed_lessons, lesson, hours) in plan {
        let mut enrollment = Enrollment::start(user.id, courses[course_index].id, now);
        enrollment.progress = progress;
        enrollment.completed_lessons = completed_lessons;
        enrollment.current_lesson = Some(lesson.to_string());
        enrollment.time_spent = hours;
        db.create_enrollment(&enrollment).await?;
        summary.enrollments += 1;
    }

    // --- Achievements ---
    let achievements = badges();
    for achievement in &achievements {
        db.insert_achievement(achievement).await?;
    }
    summary.achievements = achievements.len();

    let unlocks = [
        (0, true, Some(now - Duration::days(10)), 3),
        (1, true, Some(now - Duration::days(5)), 7),
        (2, false, None, 12),
    ];
    for (index, is_unlocked, unlocked_at, progress) in unlocks {
        db.save_user_achievement(&UserAchievement {
            id: Uuid::new_v4(),
            user_id: sarah.id,
            achievement_id: achievements[index].id,
            is_unlocked,
            unlocked_at,
            progress,
        })
        .await?;
        summary.user_achievements += 1;
    }

    // --- Recent activity ---
    let sessions = [
        ("Mathematics", now - Duration::hours(2), now, "Studied derivatives and limits"),
        (
            "Computer Science",
            now - Duration::hours(24),
            now - Duration::hours(22),
            "Practiced sorting algorithms",
        ),
    ];
    for (subject, start, end, notes) in sessions {
        db.insert_study_session(&StudySession {
            id: Uuid::new_v4(),
            user_id: sarah.id,
            subject: subject.to_string(),
            start_time: start,
            end_time: Some(end),
            duration: 2.0,
            notes: Some(notes.to_string()),
        })
        .await?;
        summary.study_sessions += 1;
    }

    let tests = [
        (1, "Data Structures & Algorithms", 94, 2, Difficulty::Hard),
        (0, "Calculus II Midterm", 87, 5, Difficulty::Medium),
    ];
    for (course_index, name, score, days_ago, difficulty) in tests {
        let course = &courses[course_index];
        db.insert_test_result(&TestResult {
            id: Uuid::new_v4(),
            user_id: sarah.id,
            course_id: Some(course.id),
            subject_id: course.category.clone(),
            test_name: name.to_string(),
            score,
            max_score: 100,
            completed_at: now - Duration::days(days_ago),
            difficulty,
        })
        .await?;
        summary.test_results += 1;
    }

    info!("Seeding complete: {:?}", summary);
    Ok(summary)
}
