//! Team domain model.
//!
//! Teams are the top-level tenant unit. Everything below them
//! (projects, sections, resources, participants) is owned by exactly
//! one team and removed with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team owns projects and is administered by its admin participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    /// Globally unique display name, also used to join the team.
    pub name: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeam {
    pub name: String,
    /// Raw join password (hashed with Argon2id before storage).
    pub password: String,
}

/// Fields that can be updated on an existing team.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTeam {
    pub name: Option<String>,
    /// Raw password; re-hashed before storage.
    pub password: Option<String>,
}

impl UpdateTeam {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.password.is_none()
    }
}
