//! Resman Auth: password verification, JWT issuance/validation, the
//! authorization gate and the OAuth login seam.

pub mod config;
pub mod error;
pub mod gate;
pub mod oauth;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use gate::{Authenticated, AuthorizationGate, Authorized};
pub use oauth::{GoogleConfig, GoogleProvider, IdentityProvider, OAuthIdentity};
pub use service::{AccountService, LoginInput, LoginOutput, RegisterInput};
pub use token::{AccessTokenClaims, AuthMethod};
