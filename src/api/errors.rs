use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::validation::FieldError;
use crate::repositories::StoreError;
use crate::services::credentials::CredentialError;
use crate::services::storage::StorageError;
use crate::services::submissions::SubmissionError;
use crate::services::tasks::TaskError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    Validation(Vec<FieldError>),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    fn body(status: StatusCode, detail: String, errors: Vec<FieldError>) -> Response {
        (status, Json(ErrorResponse { status: status.as_u16(), detail, errors })).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response =
                    Self::body(StatusCode::UNAUTHORIZED, message.to_string(), Vec::new());
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                Self::body(StatusCode::FORBIDDEN, message.to_string(), Vec::new())
            }
            ApiError::BadRequest(message) => Self::body(StatusCode::BAD_REQUEST, message, Vec::new()),
            ApiError::Validation(errors) => {
                let detail = errors
                    .first()
                    .map(|error| error.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string());
                Self::body(StatusCode::BAD_REQUEST, detail, errors)
            }
            ApiError::NotFound(message) => Self::body(StatusCode::NOT_FOUND, message, Vec::new()),
            ApiError::Internal(message) => {
                Self::body(StatusCode::INTERNAL_SERVER_ERROR, message, Vec::new())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::BadRequest("User already exists".to_string()),
            other => ApiError::internal(other, "Database error"),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::DuplicateEmail => ApiError::BadRequest("User already exists".to_string()),
            CredentialError::InvalidAdminCode => ApiError::field("adminCode", "Invalid admin code"),
            CredentialError::InvalidCredentials => {
                ApiError::BadRequest("Invalid credentials".to_string())
            }
            CredentialError::NotFound => ApiError::NotFound("User not found".to_string()),
            CredentialError::Security(err) => ApiError::internal(err, "Failed to process credentials"),
            CredentialError::Store(err) => err.into(),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound => ApiError::NotFound("Task not found".to_string()),
            TaskError::Forbidden => ApiError::Forbidden("Admin access required"),
            TaskError::Store(err) => err.into(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { limit } => ApiError::BadRequest(format!(
                "File exceeds the {} MB upload limit",
                limit / (1024 * 1024)
            )),
            StorageError::Io(err) => ApiError::internal(err, "Upload failed"),
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::MissingUserId => ApiError::field("userId", "userId is required"),
            SubmissionError::Forbidden => {
                ApiError::Forbidden("Cannot submit work on behalf of another user")
            }
            SubmissionError::TaskNotFound => ApiError::NotFound("Task not found".to_string()),
            SubmissionError::Storage(err) => err.into(),
            SubmissionError::Store(err) => ApiError::internal(err, "Upload failed"),
        }
    }
}
