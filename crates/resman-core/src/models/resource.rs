//! Resource domain model.
//!
//! A resource is the leaf of the hierarchy: a unit of work or content
//! filed under a section.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceStatus {
    type Err = String;

    /// Case-insensitive; accepts `-` or space in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(format!("unknown status '{}'", s.trim())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub section_id: i64,
    pub title: String,
    pub status: ResourceStatus,
    pub link: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResource {
    pub section_id: i64,
    pub title: String,
    #[serde(default)]
    pub status: ResourceStatus,
    pub link: Option<String>,
    pub notes: Option<String>,
}

/// Patch for a resource. For `link` and `notes` an empty string clears
/// the field.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateResource {
    pub title: Option<String>,
    pub status: Option<ResourceStatus>,
    pub link: Option<String>,
    pub notes: Option<String>,
}

impl UpdateResource {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none() && self.link.is_none() && self.notes.is_none()
    }
}
