//! Error types for the resman system.

use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ResmanError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Entity already exists: {entity}")]
    Conflict { entity: String },

    /// Deliberately carries no detail so callers cannot tell a missing
    /// account or team apart from a wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Operation rejected: {message}")]
    RuleViolation { message: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store operation timed out")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResmanError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Stable machine-checkable identifier reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::Conflict { .. } => "conflict",
            Self::InvalidCredentials => "invalid_credentials",
            Self::RuleViolation { .. } => "rule_violation",
            Self::Store(_) => "store_error",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error text may be shown to a client verbatim.
    ///
    /// Store and internal failures are logged server-side and replaced
    /// with a generic message.
    pub fn is_client_safe(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Internal(_))
    }
}

impl From<ValidationErrors> for ResmanError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

pub type ResmanResult<T> = Result<T, ResmanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let errors = [
            ResmanError::Validation(ValidationErrors::default()),
            ResmanError::not_found("team", 1),
            ResmanError::unauthorized("x"),
            ResmanError::forbidden("x"),
            ResmanError::Conflict {
                entity: "team".into(),
            },
            ResmanError::InvalidCredentials,
            ResmanError::RuleViolation {
                message: "x".into(),
            },
            ResmanError::Store("x".into()),
            ResmanError::Timeout,
            ResmanError::RateLimited,
            ResmanError::Internal("x".into()),
        ];
        let mut kinds: Vec<_> = errors.iter().map(ResmanError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn store_errors_are_not_client_safe() {
        assert!(!ResmanError::Store("index idx_x corrupted".into()).is_client_safe());
        assert!(!ResmanError::Internal("boom".into()).is_client_safe());
        assert!(ResmanError::not_found("team", 7).is_client_safe());
    }

    #[test]
    fn invalid_credentials_message_is_generic() {
        assert_eq!(
            ResmanError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
    }
}
