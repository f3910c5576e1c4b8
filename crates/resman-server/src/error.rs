//! Mapping from domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use resman_auth::AuthError;
use resman_core::error::ResmanError;
use resman_core::validation::ValidationErrors;
use serde_json::json;
use tracing::{error, warn};

/// A failed request. Every handler returns this on the error path.
#[derive(Debug)]
pub struct ApiError(pub ResmanError);

impl From<ResmanError> for ApiError {
    fn from(err: ResmanError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self(ResmanError::Validation(errors))
    }
}

impl ApiError {
    /// A request that could not be decoded.
    pub fn bad_input(field: &str, message: impl Into<String>) -> Self {
        ValidationErrors::single(field, message).into()
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ResmanError::Validation(_)
            | ResmanError::RuleViolation { .. }
            | ResmanError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ResmanError::Conflict { .. } => StatusCode::CONFLICT,
            ResmanError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ResmanError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ResmanError::NotFound { .. } => StatusCode::NOT_FOUND,
            ResmanError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ResmanError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            ResmanError::Store(_) | ResmanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match &self.0 {
            ResmanError::Validation(_) => "Validation error",
            ResmanError::NotFound { .. } => "Not found",
            ResmanError::Unauthorized { .. } => "Authentication required",
            ResmanError::Forbidden { .. } => "Access denied",
            ResmanError::Conflict { .. } => "Already exists",
            ResmanError::InvalidCredentials => "Invalid credentials",
            ResmanError::RuleViolation { .. } => "Operation rejected",
            ResmanError::RateLimited => "Too many requests",
            ResmanError::Timeout => "Store unavailable",
            ResmanError::Store(_) | ResmanError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if self.0.is_client_safe() {
            warn!(kind = self.0.kind(), error = %self.0, "request failed");
            self.0.to_string()
        } else {
            error!(kind = self.0.kind(), error = %self.0, "request failed");
            "internal server error".to_string()
        };

        let mut body = json!({
            "message": self.message(),
            "error": detail,
            "kind": self.0.kind(),
        });
        if let ResmanError::Validation(errors) = &self.0 {
            body["violations"] = json!(errors.violations);
        }
        (status, Json(body)).into_response()
    }
}
