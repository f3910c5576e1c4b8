//! Participant domain model (team membership).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binds a user to a team. Exactly one row exists per (user, team).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: i64,
    pub user_id: i64,
    pub team_id: i64,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateParticipant {
    pub user_id: i64,
    pub team_id: i64,
    #[serde(default)]
    pub admin: bool,
}
