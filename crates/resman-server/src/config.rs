//! Server configuration loaded from TOML.

use std::path::{Path, PathBuf};

use resman_auth::{AuthConfig, GoogleConfig};
use resman_db::DbConfig;
use resman_service::import::DEFAULT_MAX_BYTES;
use resman_service::listing::DEFAULT_MAX_LIMIT;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "RESMAN_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "resman.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub store: DbConfig,
    pub auth: AuthSection,
    pub rate_limit: RateLimitConfig,
    pub import: ImportConfig,
    pub listing: ListingConfig,
    /// Google login; the OAuth routes answer 404 when absent.
    pub oauth: Option<GoogleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    /// Browser origin allowed by CORS. No CORS headers when unset.
    pub allowed_origin: Option<String>,
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            allowed_origin: None,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// The `[auth]` table. Keys are read from PEM files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub jwt_private_key_path: PathBuf,
    pub jwt_public_key_path: PathBuf,
    pub jwt_issuer: String,
    pub access_token_lifetime_secs: u64,
    pub oauth_state_lifetime_secs: u64,
    pub pepper: Option<String>,
    pub min_password_length: usize,
}

impl Default for AuthSection {
    fn default() -> Self {
        let defaults = AuthConfig::default();
        Self {
            jwt_private_key_path: PathBuf::from("keys/jwt_ed25519.pem"),
            jwt_public_key_path: PathBuf::from("keys/jwt_ed25519.pub.pem"),
            jwt_issuer: defaults.jwt_issuer,
            access_token_lifetime_secs: defaults.access_token_lifetime_secs,
            oauth_state_lifetime_secs: defaults.oauth_state_lifetime_secs,
            pepper: defaults.pepper,
            min_password_length: defaults.min_password_length,
        }
    }
}

impl AuthSection {
    /// Resolve into an [`AuthConfig`], reading both key files.
    pub fn load(&self) -> Result<AuthConfig, ConfigError> {
        Ok(self.with_keys(
            read_file(&self.jwt_private_key_path)?,
            read_file(&self.jwt_public_key_path)?,
        ))
    }

    /// Resolve into an [`AuthConfig`] with keys supplied inline.
    pub fn with_keys(&self, private_pem: String, public_pem: String) -> AuthConfig {
        AuthConfig {
            jwt_private_key_pem: private_pem,
            jwt_public_key_pem: public_pem,
            access_token_lifetime_secs: self.access_token_lifetime_secs,
            jwt_issuer: self.jwt_issuer.clone(),
            pepper: self.pepper.clone(),
            min_password_length: self.min_password_length,
            oauth_state_lifetime_secs: self.oauth_state_lifetime_secs,
        }
    }
}

/// Token bucket per client address.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Burst size. Zero disables rate limiting.
    pub capacity: f64,
    pub refill_per_sec: f64,
    /// Key clients by the first `x-forwarded-for` hop instead of the
    /// peer address. Enable only behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 60.0,
            refill_per_sec: 10.0,
            trust_forwarded_for: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub max_bytes: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub max_limit: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Load from the file named by `RESMAN_CONFIG` (default
    /// `resman.toml`). Falls back to defaults if the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::parse(&read_file(path)?)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
