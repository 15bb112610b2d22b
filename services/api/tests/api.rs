//! End-to-end tests that drive the full router against an in-memory database.

use api_lib::adapters::DbAdapter;
use api_lib::config::Config;
use api_lib::web::{router, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use dashboard_core::domain::{Achievement, AchievementCategory, AchievementTier, Course, Level, NewUser};
use dashboard_core::ports::DatabaseService;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    db: Arc<DbAdapter>,
}

impl TestApp {
    async fn new() -> Self {
        let db = Arc::new(DbAdapter::connect("sqlite::memory:").await.unwrap());
        db.run_migrations().await.unwrap();
        let config = Config::from_lookup(|_| None).unwrap();
        let state = Arc::new(AppState::new(db.clone(), Arc::new(config)));
        Self {
            router: router(state),
            db,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers a student and returns their token.
    async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({"name": name, "email": email, "password": "password123"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn add_course(&self, title: &str, category: &str, total_lessons: u32) -> Course {
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("An introduction to {title}"),
            instructor: "Dr. Elena Vasquez".to_string(),
            instructor_avatar: None,
            category: category.to_string(),
            level: Level::Beginner,
            duration: "8 weeks".to_string(),
            total_lessons,
            total_tests: 4,
            rating: 4.5,
            review_count: 120,
            price: 49.0,
            original_price: None,
            image: None,
            tags: vec![category.to_string()],
            enrollment_count: 0,
            is_popular: false,
            is_new: true,
            prerequisites: vec![],
            learning_outcomes: vec![],
            syllabus: vec![],
            created_at: now,
            updated_at: now,
        };
        self.db.insert_course(&course).await.unwrap();
        course
    }

    async fn add_badge(&self, title: &str, category: AchievementCategory, max_progress: u32) {
        self.db
            .insert_achievement(&Achievement {
                id: Uuid::new_v4(),
                title: title.to_string(),
                description: title.to_string(),
                icon: "🔥".to_string(),
                category,
                tier: AchievementTier::Bronze,
                max_progress,
                requirement: title.to_string(),
            })
            .await
            .unwrap();
    }
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn register_returns_a_token_and_never_the_password() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Sarah Johnson", "email": "Sarah@Example.com", "password": "password123"}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Registration successful");
    assert_eq!(body["data"]["expiresIn"], "24h");
    assert_eq!(body["data"]["user"]["email"], "sarah@example.com");
    assert_eq!(body["data"]["user"]["preferences"]["theme"], "light");
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(!body.to_string().contains("password"));

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Someone Else", "email": "sarah@example.com", "password": "password456"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User with this email already exists");
}

#[tokio::test]
async fn register_validates_its_input() {
    let app = TestApp::new().await;
    let cases = [
        (json!({"email": "a@b.io", "password": "password123"}), "Name, email, and password are required"),
        (json!({"name": "A", "email": "a@b.io", "password": "short"}), "Password must be at least 8 characters"),
        (json!({"name": "A", "email": "not-an-email", "password": "password123"}), "Invalid email format"),
    ];
    for (payload, message) in cases {
        let (status, body) = app.post("/api/auth/register", None, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], message);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn login_checks_credentials() {
    let app = TestApp::new().await;
    app.register("John Doe", "john@example.com").await;

    let (status, body) = app
        .post("/api/auth/login", None, json!({"email": "john@example.com", "password": "wrong-password"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app
        .post("/api/auth/login", None, json!({"email": "nobody@example.com", "password": "password123"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = app.post("/api/auth/login", None, json!({"email": "john@example.com"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");

    let (status, body) = app
        .post("/api/auth/login", None, json!({"email": "john@example.com", "password": "password123"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert!(body["data"]["user"]["lastLoginAt"].is_string());

    let (status, body) = app.post("/api/auth/logout", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());
    assert_eq!(body["message"], "Logout successful");
}

#[tokio::test]
async fn imported_bcrypt_accounts_can_log_in() {
    let app = TestApp::new().await;
    app.db
        .create_user(NewUser {
            name: "Sarah Johnson".to_string(),
            email: "sarah.johnson@email.com".to_string(),
            password_hash: bcrypt::hash("password123", 4).unwrap(),
            ..Default::default()
        })
        .await
        .unwrap();

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "sarah.johnson@email.com", "password": "password123"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["user"]["name"], "Sarah Johnson");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "sarah.johnson@email.com", "password": "password124"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/user/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    let (status, body) = app.get("/api/courses/enrolled/me", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    let token = app.register("Emily Chen", "emily@example.com").await;
    let (status, body) = app.get("/api/user/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Emily Chen");
}

//=========================================================================================
// Courses
//=========================================================================================

#[tokio::test]
async fn catalog_filters_and_reports_categories() {
    let app = TestApp::new().await;
    app.add_course("Classical Mechanics", "Physics", 42).await;
    app.add_course("Calculus I", "Mathematics", 48).await;

    let (status, body) = app.get("/api/courses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["categories"], json!(["Physics", "Mathematics"]));
    assert_eq!(body["data"]["levels"], json!(["Beginner", "Intermediate", "Advanced"]));

    let (_, body) = app.get("/api/courses?category=Physics", None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["courses"][0]["title"], "Classical Mechanics");
    assert_eq!(body["data"]["categories"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/api/courses?search=calc&category=All", None).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn unknown_or_malformed_course_ids_are_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.get(&format!("/api/courses/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");

    let (status, body) = app.get("/api/courses/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Course not found");
}

#[tokio::test]
async fn enroll_progress_and_unenroll() {
    let app = TestApp::new().await;
    let course = app.add_course("Calculus I", "Mathematics", 40).await;
    let token = app.register("Sarah Johnson", "sarah@example.com").await;
    let detail = format!("/api/courses/{}", course.id);

    let (_, body) = app.get(&detail, None).await;
    assert_eq!(body["data"]["isEnrolled"], false);

    let (status, body) = app
        .send(Method::POST, &format!("{detail}/enroll"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Successfully enrolled in course");
    assert_eq!(body["data"]["progress"], 0.0);
    assert_eq!(body["data"]["enrollmentCount"], 1);

    let (status, body) = app
        .send(Method::POST, &format!("{detail}/enroll"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Already enrolled in this course");

    let (_, body) = app.get(&detail, Some(&token)).await;
    assert_eq!(body["data"]["isEnrolled"], true);

    // Progress is clamped to the course length.
    let (status, body) = app
        .send(
            Method::PUT,
            &format!("{detail}/progress"),
            Some(&token),
            Some(json!({"completedLessons": 10, "currentLesson": "Limits", "timeSpent": 1.5})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["progress"], 25.0);
    assert_eq!(body["data"]["timeSpent"], 1.5);

    let (_, body) = app
        .send(
            Method::PUT,
            &format!("{detail}/progress"),
            Some(&token),
            Some(json!({"completedLessons": 999})),
        )
        .await;
    assert_eq!(body["data"]["progress"], 100.0);
    assert_eq!(body["data"]["completedLessons"], 40);
    assert_eq!(body["data"]["certificateEarned"], true);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("{detail}/progress"),
            Some(&token),
            Some(json!({"timeSpent": -2.0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/courses/enrolled/me?filter=completed", Some(&token)).await;
    assert_eq!(body["data"]["courses"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["stats"]["total"], 1);
    assert_eq!(body["data"]["stats"]["completed"], 1);
    assert_eq!(body["data"]["stats"]["certificatesEarned"], 1);

    let (status, body) = app
        .send(Method::DELETE, &format!("{detail}/unenroll"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully unenrolled from course");
    assert!(body["data"].is_null());

    let (status, body) = app
        .send(Method::DELETE, &format!("{detail}/unenroll"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Enrollment not found");

    assert_eq!(app.db.get_course(course.id).await.unwrap().enrollment_count, 0);
    let (_, body) = app.get("/api/courses/enrolled/me", Some(&token)).await;
    assert_eq!(body["data"]["stats"]["averageProgress"], 0.0);
}

//=========================================================================================
// User
//=========================================================================================

#[tokio::test]
async fn profile_updates_merge_preferences() {
    let app = TestApp::new().await;
    let token = app.register("John Doe", "john@example.com").await;
    app.register("Taken", "taken@example.com").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/user/profile",
            Some(&token),
            Some(json!({"name": "Johnny Doe", "preferences": {"theme": "dark"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["data"]["name"], "Johnny Doe");
    assert_eq!(body["data"]["preferences"]["theme"], "dark");
    assert_eq!(body["data"]["preferences"]["emailNotifications"], true);

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/user/profile",
            Some(&token),
            Some(json!({"email": "taken@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn study_sessions_drive_streaks_and_achievements() {
    let app = TestApp::new().await;
    app.add_badge("Study Starter", AchievementCategory::Streak, 3).await;
    app.add_badge("First Sprint", AchievementCategory::Milestone, 50).await;
    app.add_badge("Weekend Challenge", AchievementCategory::Challenge, 2).await;
    let token = app.register("Emily Chen", "emily@example.com").await;

    let yesterday = Utc::now() - Duration::days(1);
    let today = Utc::now();
    for (start, hours) in [(yesterday, 2.0), (today, 1.5), (today, 0.5)] {
        let (status, body) = app
            .post(
                "/api/user/study-sessions",
                Some(&token),
                json!({"subject": "Physics", "startTime": start, "duration": hours}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (_, body) = app.get("/api/user/dashboard", Some(&token)).await;
    let dashboard = &body["data"];
    assert_eq!(dashboard["currentStreak"], 2);
    assert_eq!(dashboard["longestStreak"], 2);
    assert_eq!(dashboard["totalStudyDays"], 2);
    assert_eq!(dashboard["studyStats"]["overall"], 4.0);
    assert_eq!(dashboard["enrolledSubjects"][0]["name"], "Physics");

    let (_, body) = app.get("/api/user/achievements", Some(&token)).await;
    let achievements = body["data"]["achievements"].as_array().unwrap();
    assert_eq!(achievements.len(), 3);
    assert_eq!(achievements[0]["progress"], 2);
    assert_eq!(achievements[0]["isUnlocked"], false);
    assert_eq!(achievements[1]["progress"], 4);
    assert_eq!(achievements[2]["progress"], 0);
    assert_eq!(body["data"]["stats"]["total"], 3);

    let (_, body) = app.get("/api/user/achievements?category=streak", Some(&token)).await;
    assert_eq!(body["data"]["achievements"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["stats"]["total"], 3);

    let (_, body) = app.get("/api/user/study-sessions", Some(&token)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = app
        .post(
            "/api/user/study-sessions",
            Some(&token),
            json!({"subject": "Physics", "startTime": today, "endTime": yesterday}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn test_results_are_validated_and_counted() {
    let app = TestApp::new().await;
    let course = app.add_course("Machine Learning", "Artificial Intelligence", 72).await;
    app.add_badge("Test Ace", AchievementCategory::Performance, 2).await;
    let token = app.register("Raj Patel", "raj@example.com").await;

    let invalid = [
        json!({"subjectId": "AI", "testName": "Quiz", "score": 11, "maxScore": 10, "difficulty": "Easy"}),
        json!({"subjectId": "AI", "testName": "Quiz", "score": 5, "maxScore": 0, "difficulty": "Easy"}),
        json!({"subjectId": "AI", "testName": "Quiz", "score": -1, "maxScore": 10, "difficulty": "Easy"}),
        json!({"testName": "Quiz", "score": 5, "maxScore": 10, "difficulty": "Easy"}),
    ];
    for payload in invalid {
        let (status, _) = app.post("/api/user/test-results", Some(&token), payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .post(
            "/api/user/test-results",
            Some(&token),
            json!({"courseId": Uuid::new_v4(), "subjectId": "AI", "testName": "Quiz", "score": 5, "maxScore": 10, "difficulty": "Easy"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for score in [95, 90, 40] {
        let (status, body) = app
            .post(
                "/api/user/test-results",
                Some(&token),
                json!({"courseId": course.id, "subjectId": "Artificial Intelligence", "testName": "Neural Networks", "score": score, "maxScore": 100, "difficulty": "Hard"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (_, body) = app.get("/api/user/achievements", Some(&token)).await;
    let ace = &body["data"]["achievements"][0];
    assert_eq!(ace["progress"], 2);
    assert_eq!(ace["isUnlocked"], true);
    assert!(ace["unlockedAt"].is_string());
    assert_eq!(body["data"]["stats"]["unlocked"], 1);

    let (_, body) = app.get("/api/user/dashboard", Some(&token)).await;
    assert_eq!(body["data"]["recentTests"].as_array().unwrap().len(), 3);

    let (_, body) = app.get("/api/user/study-stats", Some(&token)).await;
    assert_eq!(body["data"]["weeklyTrend"].as_array().unwrap().len(), 4);
}

//=========================================================================================
// Misc
//=========================================================================================

#[tokio::test]
async fn health_root_and_fallback() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "OK");
    assert_eq!(body["data"]["environment"], "development");
    assert_eq!(body["message"], "Server is healthy");

    let (status, body) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["endpoints"]["courses"], "/api/courses");

    let (status, body) = app.get("/api/nothing-here", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route /api/nothing-here not found");

    let (_, body) = app.get("/api/nothing-here?page=2", None).await;
    assert_eq!(body["error"], "Route /api/nothing-here?page=2 not found");
}

#[tokio::test]
async fn unsupported_methods_on_known_paths_get_the_envelope() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/auth/login", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Route /api/auth/login not found");

    let token = app.register("Kim Lee", "kim@example.com").await;
    let (status, body) = app
        .send(Method::DELETE, "/api/user/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route /api/user/profile not found");
}

#[tokio::test]
async fn tests_on_courses_outside_the_enrollment_count_toward_their_category() {
    let app = TestApp::new().await;
    let token = app.register("Emily Chen", "emily@example.com").await;
    let calculus = app.add_course("Calculus I", "Mathematics", 20).await;

    let (status, _) = app
        .post(
            "/api/user/study-sessions",
            Some(&token),
            json!({"subject": "Mathematics", "startTime": Utc::now(), "duration": 1.5}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/api/user/test-results",
            Some(&token),
            json!({
                "courseId": calculus.id,
                "subjectId": "calc-midterm",
                "testName": "Calculus Midterm",
                "score": 45,
                "maxScore": 50,
                "difficulty": "Hard"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, body) = app.get("/api/user/study-stats", Some(&token)).await;
    let by_subject = body["data"]["bySubject"].as_array().unwrap();
    assert_eq!(by_subject.len(), 1);
    assert_eq!(by_subject[0]["subject"], "Mathematics");
    assert_eq!(by_subject[0]["testsCompleted"], 1);

    let (_, body) = app.get("/api/user/dashboard", Some(&token)).await;
    assert_eq!(body["data"]["enrolledSubjects"][0]["testsCompleted"], 1);
}

#[tokio::test]
async fn malformed_json_is_rejected_with_the_envelope() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Invalid JSON in request body");
    assert_eq!(body["success"], false);
}
