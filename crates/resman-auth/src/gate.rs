//! The authorization gate consulted by every protected request.
//!
//! `authenticate` turns a bearer token into a user identity without any
//! store access; `authorize` and `require_admin` resolve the caller's
//! membership in a team. The gate only reads participant state.

use std::sync::Arc;

use resman_core::error::{ResmanError, ResmanResult};
use resman_core::repository::{ParticipantRepository, Store};
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::{self, AuthMethod, ValidatedClaims};

/// A caller whose bearer token was verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated {
    pub user_id: i64,
    pub method: AuthMethod,
}

/// A caller known to participate in `team_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorized {
    pub user_id: i64,
    pub team_id: i64,
    pub is_admin: bool,
}

pub struct AuthorizationGate<S: Store> {
    store: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S: Store> AuthorizationGate<S> {
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { store, config }
    }

    pub fn authenticate(&self, bearer: &str) -> ResmanResult<Authenticated> {
        let bearer = bearer.trim();
        if bearer.is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        let ValidatedClaims(claims) = token::validate_access_token(bearer, &self.config)?;
        Ok(Authenticated {
            user_id: claims.user_id()?,
            method: claims.auth_method,
        })
    }

    pub async fn authorize(&self, caller: Authenticated, team_id: i64) -> ResmanResult<Authorized> {
        match self.store.participants().get(team_id, caller.user_id).await {
            Ok(participant) => Ok(Authorized {
                user_id: caller.user_id,
                team_id,
                is_admin: participant.admin,
            }),
            Err(ResmanError::NotFound { .. }) => {
                debug!(user_id = caller.user_id, team_id, "caller is not a participant");
                Err(ResmanError::forbidden("not a participant of this team"))
            }
            Err(other) => Err(other),
        }
    }

    pub async fn require_admin(
        &self,
        caller: Authenticated,
        team_id: i64,
    ) -> ResmanResult<Authorized> {
        let authorized = self.authorize(caller, team_id).await?;
        if !authorized.is_admin {
            return Err(ResmanError::forbidden("team admin required"));
        }
        Ok(authorized)
    }
}
