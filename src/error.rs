//! Feed error types and their HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::TokenError;
use crate::query::InvalidParameter;
use crate::search::SearchError;

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Missing, malformed, wrongly signed or expired token
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameter),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Backend communication failed: {0}")]
    Backend(#[from] SearchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FeedError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FeedError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            FeedError::InvalidParameter(_) | FeedError::BadRequest(_) => StatusCode::BAD_REQUEST,
            FeedError::Backend(_) => StatusCode::BAD_GATEWAY,
            FeedError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for FeedError {
    fn from(err: TokenError) -> Self {
        FeedError::Unauthenticated(err.to_string())
    }
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Only validation errors echo detail back; the rest is logged here
        let body = match &self {
            FeedError::Unauthenticated(reason) => {
                warn!(%reason, "Rejected unauthenticated request");
                json!({
                    "error": "Unauthorized",
                    "message": "Invalid or missing authorization header"
                })
            }
            FeedError::InvalidParameter(_) | FeedError::BadRequest(_) => {
                warn!(error = %self, "Rejected request parameters");
                json!({
                    "error": self.to_string(),
                    "code": "bad_request"
                })
            }
            FeedError::Backend(source) => {
                error!(error = %source, "Search backend call failed");
                json!({
                    "error": "Failed to communicate with backend",
                    "code": "bad_gateway"
                })
            }
            FeedError::Internal(detail) => {
                error!(%detail, "Internal error");
                json!({
                    "error": "An internal error occurred",
                    "code": "internal_error"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
