//! Authentication error types.

use resman_core::error::ResmanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for ResmanError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ResmanError::InvalidCredentials,
            AuthError::MissingToken
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::Provider(_) => ResmanError::Unauthorized {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => ResmanError::Internal(msg),
        }
    }
}
