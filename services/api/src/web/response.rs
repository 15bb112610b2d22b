//! services/api/src/web/response.rs
//!
//! The uniform response envelope. Every body the API sends is either
//! `{success: true, data, message?, timestamp}` or
//! `{success: false, error, timestamp}`.

use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The failure half of the envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// A successful response: status code plus envelope.
pub struct ApiResponse<T> {
    status: StatusCode,
    body: SuccessBody<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with no message.
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: SuccessBody {
                success: true,
                data,
                message: None,
                timestamp: Utc::now(),
            },
        }
    }

    /// 201 with a message.
    pub fn created(data: T, message: &str) -> Self {
        let mut response = Self::ok(data).with_message(message);
        response.status = StatusCode::CREATED;
        response
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.body.message = Some(message.to_string());
        self
    }
}

impl ApiResponse<()> {
    /// 200 with `data: null`.
    pub fn empty(message: &str) -> Self {
        Self::ok(()).with_message(message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn error_response(status: StatusCode, message: String) -> Response {
    let body = ErrorBody {
        success: false,
        error: message,
        timestamp: Utc::now(),
    };
    (status, Json(body)).into_response()
}

//=========================================================================================
// JSON Body Extractor
//=========================================================================================

/// Like `axum::Json`, but rejects malformed bodies with the error envelope.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(match rejection {
                JsonRejection::JsonSyntaxError(_) => {
                    ApiError::BadRequest("Invalid JSON in request body".to_string())
                }
                JsonRejection::JsonDataError(e) => {
                    ApiError::BadRequest(format!("Invalid request body: {}", e.body_text()))
                }
                JsonRejection::MissingJsonContentType(_) => ApiError::BadRequest(
                    "Expected request with `Content-Type: application/json`".to_string(),
                ),
                other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    ApiError::BadRequest("Request body too large".to_string())
                }
                other => ApiError::BadRequest(other.body_text()),
            }),
        }
    }
}
