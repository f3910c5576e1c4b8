//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account. Users are independent of teams and only become
/// associated with one through a participant record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string; `None` for accounts created through OAuth.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    /// Subject identifier issued by the external identity provider.
    #[serde(skip_serializing, default)]
    pub oauth_subject: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// Raw password (will be hashed with Argon2id before storage).
    pub password: Option<String>,
    pub oauth_subject: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Raw password; re-hashed before storage.
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_never_serialized() {
        let user = User {
            id: 4,
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: Some("$argon2id$v=19$secret".into()),
            oauth_subject: Some("10987".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("10987"));
    }
}
