//! crates/dashboard_client/src/client.rs
//!
//! `ApiClient` wraps every dashboard route. Responses are unwrapped from the
//! `{success, data, message, timestamp}` envelope; failures come back as
//! `ClientError`.

use crate::error::{ClientError, ClientResult};
use crate::token::TokenStore;
use chrono::{DateTime, Utc};
use dashboard_core::achievements::AchievementListing;
use dashboard_core::catalog::{CourseListing, CourseQuery, EnrolledListing, EnrolledQuery, ProgressUpdate};
use dashboard_core::domain::{
    CourseDetail, Difficulty, EnrolledCourse, PreferencesUpdate, StudySession, TestResult, User,
};
use dashboard_core::stats::{Dashboard, DetailedStudyStats};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// A signed-in session as returned by login and registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub expires_in: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
    pub environment: String,
}

/// Fields to change on the profile; `None` keeps the current value.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencesUpdate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudySession {
    pub subject: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Uuid>,
    pub subject_id: String,
    pub test_name: String,
    pub score: u32,
    pub max_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub difficulty: Difficulty,
}

#[derive(Serialize)]
struct Credentials<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
    password: &'a str,
}

//=========================================================================================
// The Client
//=========================================================================================

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:3001`.
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.load().is_some()
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.tokens.load() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and unwraps the envelope, allowing `data: null`.
    async fn send_optional<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<Option<T>> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED {
            let message = error_message(&bytes).unwrap_or_else(|| "Unauthorized".to_string());
            if let Err(e) = self.tokens.clear() {
                warn!("Failed to clear rejected token: {}", e);
            }
            return Err(ClientError::Unauthorized(message));
        }

        let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(ClientError::Decode(e.to_string())),
            Err(_) => {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message: String::from_utf8_lossy(&bytes).into_owned(),
                })
            }
        };

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.error.unwrap_or_else(|| status.to_string()),
            });
        }
        Ok(envelope.data)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        self.send_optional(builder)
            .await?
            .ok_or_else(|| ClientError::Decode("response carried no data".to_string()))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> ClientResult<()> {
        self.send_optional::<serde_json::Value>(builder).await.map(|_| ())
    }

    // --- Auth ---

    /// Logs in and stores the returned token.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let body = Credentials { name: None, email, password };
        let session: AuthSession = self
            .send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await?;
        self.tokens.save(&session.token)?;
        debug!("Logged in as {}", session.user.email);
        Ok(session)
    }

    /// Registers and stores the returned token.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClientResult<AuthSession> {
        let body = Credentials { name: Some(name), email, password };
        let session: AuthSession = self
            .send(self.request(Method::POST, "/api/auth/register").json(&body))
            .await?;
        self.tokens.save(&session.token)?;
        Ok(session)
    }

    /// Logs out. The stored token is dropped even when the request fails.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.send_empty(self.request(Method::POST, "/api/auth/logout")).await;
        self.tokens.clear()?;
        result
    }

    // --- Courses ---

    pub async fn courses(&self, query: &CourseQuery) -> ClientResult<CourseListing> {
        self.send(self.request(Method::GET, "/api/courses").query(query)).await
    }

    pub async fn course(&self, course_id: Uuid) -> ClientResult<CourseDetail> {
        self.send(self.request(Method::GET, &format!("/api/courses/{course_id}"))).await
    }

    pub async fn enrolled_courses(&self, query: &EnrolledQuery) -> ClientResult<EnrolledListing> {
        self.send(self.request(Method::GET, "/api/courses/enrolled/me").query(query))
            .await
    }

    pub async fn enroll(&self, course_id: Uuid) -> ClientResult<EnrolledCourse> {
        self.send(self.request(Method::POST, &format!("/api/courses/{course_id}/enroll")))
            .await
    }

    pub async fn unenroll(&self, course_id: Uuid) -> ClientResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/api/courses/{course_id}/unenroll")))
            .await
    }

    pub async fn update_progress(&self, course_id: Uuid, update: &ProgressUpdate) -> ClientResult<EnrolledCourse> {
        self.send(
            self.request(Method::PUT, &format!("/api/courses/{course_id}/progress"))
                .json(update),
        )
        .await
    }

    // --- User ---

    pub async fn profile(&self) -> ClientResult<User> {
        self.send(self.request(Method::GET, "/api/user/profile")).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        self.send(self.request(Method::PUT, "/api/user/profile").json(update))
            .await
    }

    pub async fn dashboard(&self) -> ClientResult<Dashboard> {
        self.send(self.request(Method::GET, "/api/user/dashboard")).await
    }

    pub async fn achievements(&self, category: Option<&str>) -> ClientResult<AchievementListing> {
        let mut builder = self.request(Method::GET, "/api/user/achievements");
        if let Some(category) = category {
            builder = builder.query(&[("category", category)]);
        }
        self.send(builder).await
    }

    pub async fn study_stats(&self) -> ClientResult<DetailedStudyStats> {
        self.send(self.request(Method::GET, "/api/user/study-stats")).await
    }

    pub async fn log_study_session(&self, session: &NewStudySession) -> ClientResult<StudySession> {
        self.send(self.request(Method::POST, "/api/user/study-sessions").json(session))
            .await
    }

    pub async fn study_sessions(&self) -> ClientResult<Vec<StudySession>> {
        self.send(self.request(Method::GET, "/api/user/study-sessions")).await
    }

    pub async fn log_test_result(&self, result: &NewTestResult) -> ClientResult<TestResult> {
        self.send(self.request(Method::POST, "/api/user/test-results").json(result))
            .await
    }

    // --- Misc ---

    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.send(self.request(Method::GET, "/health")).await
    }
}

fn error_message(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<Envelope<serde_json::Value>>(bytes)
        .ok()
        .and_then(|e| e.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;

    #[test]
    fn base_url_loses_trailing_slashes() {
        let client = ApiClient::new("http://localhost:3001//", Arc::new(MemoryTokenStore::new())).unwrap();
        assert_eq!(client.base_url, "http://localhost:3001");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn error_envelopes_yield_their_message() {
        let body = br#"{"success":false,"error":"Invalid credentials","timestamp":"2024-05-01T00:00:00Z"}"#;
        assert_eq!(error_message(body).as_deref(), Some("Invalid credentials"));
        assert_eq!(error_message(b"<html>"), None);
    }

    #[test]
    fn profile_updates_skip_absent_fields() {
        let update = ProfileUpdate {
            name: Some("Sarah".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({"name": "Sarah"}));
    }
}
