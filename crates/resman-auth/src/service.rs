//! Account service: registration, password login and OAuth login.

use std::sync::Arc;

use resman_core::error::{ResmanError, ResmanResult};
use resman_core::models::user::{CreateUser, User};
use resman_core::repository::{Store, UserRepository};
use resman_core::validation::{MAX_NAME_LEN, Validator};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::AuthConfig;
use crate::oauth::OAuthIdentity;
use crate::password;
use crate::token::{self, AuthMethod};

/// Input for account registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Input for the password login flow.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user_id: i64,
}

/// Account service.
///
/// Generic over the store so that the auth layer has no dependency on
/// the database crate.
pub struct AccountService<S: Store> {
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S: Store> AccountService<S> {
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    fn issue(&self, user_id: i64, method: AuthMethod) -> ResmanResult<LoginOutput> {
        let access_token = token::issue_access_token(user_id, method, &self.config)?;
        Ok(LoginOutput {
            access_token,
            token_type: "Bearer",
            expires_in: self.config.access_token_lifetime_secs,
            user_id,
        })
    }

    /// Create a password account.
    #[instrument(skip_all, fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> ResmanResult<User> {
        Validator::new()
            .text("username", &input.username, MAX_NAME_LEN)
            .email("email", &input.email)
            .password("password", &input.password, self.config.min_password_length)
            .finish()?;

        let user = self
            .store
            .users()
            .create(CreateUser {
                username: input.username.trim().to_string(),
                email: input.email.trim().to_string(),
                password: Some(input.password),
                oauth_subject: None,
            })
            .await?;

        info!(user_id = user.id, "account registered");
        Ok(user)
    }

    /// Authenticate with email + password and issue an access token.
    ///
    /// Unknown email, password-less (OAuth) account and wrong password
    /// all fail with the same `InvalidCredentials`.
    #[instrument(skip_all)]
    pub async fn login(&self, input: LoginInput) -> ResmanResult<LoginOutput> {
        let user = match self.store.users().get_by_email(&input.email).await {
            Ok(user) => Some(user),
            Err(ResmanError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        password::verify_credentials(
            &input.password,
            user.as_ref().and_then(|u| u.password_hash.as_deref()),
            self.config.pepper.as_deref(),
        )?;

        // verify_credentials only succeeds when a user was found.
        let user_id = user.map(|u| u.id).ok_or(ResmanError::InvalidCredentials)?;
        info!(user_id, "password login");
        self.issue(user_id, AuthMethod::Password)
    }

    /// Find or create the account bound to a provider identity and issue
    /// an access token.
    ///
    /// An email already used by a different account is a `Conflict`;
    /// accounts are never linked implicitly.
    #[instrument(skip_all, fields(subject = %identity.subject))]
    pub async fn oauth_login(&self, identity: OAuthIdentity) -> ResmanResult<LoginOutput> {
        let user = match self.store.users().get_by_oauth_subject(&identity.subject).await {
            Ok(user) => user,
            Err(ResmanError::NotFound { .. }) => {
                let username = identity
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| identity.email.split('@').next().unwrap_or("user").to_string());
                let username: String = username.chars().take(MAX_NAME_LEN).collect();

                let user = self
                    .store
                    .users()
                    .create(CreateUser {
                        username,
                        email: identity.email.clone(),
                        password: None,
                        oauth_subject: Some(identity.subject.clone()),
                    })
                    .await?;
                info!(user_id = user.id, "account created from oauth identity");
                user
            }
            Err(e) => return Err(e),
        };

        self.issue(user.id, AuthMethod::Oauth)
    }

    /// Issue the signed `state` parameter for an OAuth redirect.
    pub fn oauth_state(&self) -> ResmanResult<String> {
        Ok(token::issue_oauth_state(&self.config)?)
    }

    /// Verify a `state` parameter returned by the provider.
    pub fn check_oauth_state(&self, state: &str) -> ResmanResult<()> {
        Ok(token::verify_oauth_state(state, &self.config)?)
    }
}
