//! SurrealDB repository implementations.

mod participant;
mod project;
mod resource;
mod section;
mod team;
mod user;

use surrealdb_types::SurrealValue;

pub use participant::SurrealParticipantRepository;
pub use project::SurrealProjectRepository;
pub use resource::SurrealResourceRepository;
pub use section::SurrealSectionRepository;
pub use team::SurrealTeamRepository;
pub use user::SurrealUserRepository;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}
