//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.
//!
//! Messages are returned to clients verbatim, so variants carry the final
//! user-facing text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::feedback::FeedbackError;
use crate::preorder::PreOrderError;
use crate::social::SocialError;
use crate::store::StoreError;
use crate::verification::VerificationError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid input
    #[error("{0}")]
    Validation(String),

    /// Caller may not perform the action
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with existing state
    #[error("{0}")]
    Conflict(String),

    /// A vendor call failed
    #[error("{0}")]
    Upstream(String),

    /// Document store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("{0}")]
    Internal(String),

    /// Service unavailable (dependency down or not configured)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

impl From<SocialError> for ApiError {
    fn from(e: SocialError) -> Self {
        match e {
            SocialError::Store(e) => ApiError::Store(e),
            SocialError::Validation(msg) => ApiError::Validation(msg),
            SocialError::UnknownField(_) | SocialError::SelfRequest => {
                ApiError::Validation(e.to_string())
            }
            SocialError::ProfileNotFound(_)
            | SocialError::RequestNotFound(_)
            | SocialError::GroupNotFound(_)
            | SocialError::ChannelNotFound(_)
            | SocialError::EventNotFound(_) => ApiError::NotFound(e.to_string()),
            SocialError::AlreadyFriends | SocialError::AlreadyRequested => {
                ApiError::Conflict(e.to_string())
            }
            SocialError::NotChannelCreator => ApiError::Forbidden(e.to_string()),
        }
    }
}

impl From<FeedbackError> for ApiError {
    fn from(e: FeedbackError) -> Self {
        match e {
            FeedbackError::MissingFields | FeedbackError::InvalidType(_) => {
                ApiError::Validation(e.to_string())
            }
            FeedbackError::NotConfigured => ApiError::Internal(e.to_string()),
            FeedbackError::Send(ref source) => {
                tracing::error!(error = %source, "Feedback email failed");
                ApiError::Upstream(e.to_string())
            }
        }
    }
}

impl From<PreOrderError> for ApiError {
    fn from(e: PreOrderError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<VerificationError> for ApiError {
    fn from(e: VerificationError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
