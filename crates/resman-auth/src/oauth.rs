//! OAuth login seam.
//!
//! The code-for-identity exchange with a third-party provider sits
//! behind [`IdentityProvider`]; [`GoogleProvider`] implements it over
//! Google's OpenID Connect endpoints.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::error::AuthError;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// The identity asserted by a provider after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    /// Provider-scoped stable subject, stored as `provider:sub`.
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser, carrying the signed `state`.
    fn authorize_url(&self, state: &str) -> Result<String, AuthError>;

    /// Exchange an authorization code for the caller's identity.
    fn exchange(&self, code: &str)
    -> impl Future<Output = Result<OAuthIdentity, AuthError>> + Send;
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }
}

impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Provider(format!("authorize url: {e}")))?;
        Ok(url.to_string())
    }

    #[instrument(skip_all)]
    async fn exchange(&self, code: &str) -> Result<OAuthIdentity, AuthError> {
        let token: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "google token exchange failed");
                AuthError::Provider("token exchange failed".into())
            })?
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("token response: {e}")))?;

        let info: UserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "google userinfo request failed");
                AuthError::Provider("userinfo request failed".into())
            })?
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("userinfo response: {e}")))?;

        identity_from_userinfo(info)
    }
}

fn identity_from_userinfo(info: UserInfo) -> Result<OAuthIdentity, AuthError> {
    let email = match info.email {
        Some(email) if info.email_verified => email,
        _ => return Err(AuthError::Provider("verified email required".into())),
    };
    Ok(OAuthIdentity {
        subject: format!("google:{}", info.sub),
        email,
        name: info.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GoogleProvider {
        GoogleProvider::new(GoogleConfig {
            client_id: "client-1".into(),
            client_secret: "secret".into(),
            redirect_url: "https://resman.example/auth/google_callback".into(),
        })
    }

    #[test]
    fn authorize_url_carries_state_and_client() {
        let url = provider().authorize_url("signed.state.value").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(GOOGLE_AUTHORIZE_URL));
        assert!(params.contains(&("state".into(), "signed.state.value".into())));
        assert!(params.contains(&("client_id".into(), "client-1".into())));
        assert!(params.contains(&("response_type".into(), "code".into())));
    }

    #[test]
    fn userinfo_payload_decodes() {
        let info: UserInfo = serde_json::from_str(
            r#"{"sub":"1098","email":"Ada@Example.com","email_verified":true,"picture":"x"}"#,
        )
        .unwrap();
        let identity = identity_from_userinfo(info).unwrap();
        assert_eq!(identity.subject, "google:1098");
        assert_eq!(identity.name, None);
    }

    #[test]
    fn unverified_email_is_rejected() {
        let info = UserInfo {
            sub: "123".into(),
            email: Some("ada@example.com".into()),
            email_verified: false,
            name: None,
        };
        assert!(identity_from_userinfo(info).is_err());
    }

    #[test]
    fn subject_is_namespaced_by_provider() {
        let info = UserInfo {
            sub: "123".into(),
            email: Some("ada@example.com".into()),
            email_verified: true,
            name: Some("Ada".into()),
        };
        let identity = identity_from_userinfo(info).unwrap();
        assert_eq!(identity.subject, "google:123");
        assert_eq!(identity.email, "ada@example.com");
    }
}
