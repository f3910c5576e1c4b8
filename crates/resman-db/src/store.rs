//! The repository bundle over one SurrealDB connection.

use std::time::Duration;

use resman_core::repository::Store;
use surrealdb::{Connection, Surreal};

use crate::repository::{
    SurrealParticipantRepository, SurrealProjectRepository, SurrealResourceRepository,
    SurrealSectionRepository, SurrealTeamRepository, SurrealUserRepository,
};

/// Settings shared by every repository in a [`SurrealStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Server-side secret prepended to passwords before hashing.
    pub pepper: Option<String>,
    pub query_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            pepper: None,
            query_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct SurrealStore<C: Connection> {
    users: SurrealUserRepository<C>,
    teams: SurrealTeamRepository<C>,
    participants: SurrealParticipantRepository<C>,
    projects: SurrealProjectRepository<C>,
    sections: SurrealSectionRepository<C>,
    resources: SurrealResourceRepository<C>,
}

impl<C: Connection> SurrealStore<C> {
    pub fn new(db: Surreal<C>, options: StoreOptions) -> Self {
        let timeout = options.query_timeout;
        Self {
            users: SurrealUserRepository::new(db.clone())
                .with_pepper(options.pepper.clone())
                .with_timeout(timeout),
            teams: SurrealTeamRepository::new(db.clone())
                .with_pepper(options.pepper)
                .with_timeout(timeout),
            participants: SurrealParticipantRepository::new(db.clone()).with_timeout(timeout),
            projects: SurrealProjectRepository::new(db.clone()).with_timeout(timeout),
            sections: SurrealSectionRepository::new(db.clone()).with_timeout(timeout),
            resources: SurrealResourceRepository::new(db).with_timeout(timeout),
        }
    }
}

impl<C: Connection> Store for SurrealStore<C> {
    type Users = SurrealUserRepository<C>;
    type Teams = SurrealTeamRepository<C>;
    type Participants = SurrealParticipantRepository<C>;
    type Projects = SurrealProjectRepository<C>;
    type Sections = SurrealSectionRepository<C>;
    type Resources = SurrealResourceRepository<C>;

    fn users(&self) -> &Self::Users {
        &self.users
    }

    fn teams(&self) -> &Self::Teams {
        &self.teams
    }

    fn participants(&self) -> &Self::Participants {
        &self.participants
    }

    fn projects(&self) -> &Self::Projects {
        &self.projects
    }

    fn sections(&self) -> &Self::Sections {
        &self.sections
    }

    fn resources(&self) -> &Self::Resources {
        &self.resources
    }
}
