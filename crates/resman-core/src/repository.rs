//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Multi-statement mutations
//! (cascading deletes, guarded membership changes, child creation under
//! a parent) must be atomic in the implementation.

use crate::error::ResmanResult;
use crate::models::{
    participant::{CreateParticipant, Participant},
    project::{CreateProject, Project, UpdateProject},
    resource::{CreateResource, Resource, UpdateResource},
    section::{CreateSection, Section, UpdateSection},
    team::{CreateTeam, Team, UpdateTeam},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
///
/// `limit = None` means every row after `offset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: Option<u64>,
}

/// Pagination plus an optional name/title filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub pagination: Pagination,
    /// Lowercased substring; matched case-insensitively.
    pub filter: Option<String>,
}

/// A paginated result set.
///
/// `total` counts every row matching the filter, not just this page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: Option<u64>,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = ResmanResult<User>> + Send;
    fn get_by_id(&self, id: i64) -> impl Future<Output = ResmanResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = ResmanResult<User>> + Send;
    fn get_by_oauth_subject(
        &self,
        subject: &str,
    ) -> impl Future<Output = ResmanResult<User>> + Send;
    fn update(&self, id: i64, input: UpdateUser)
    -> impl Future<Output = ResmanResult<User>> + Send;
    /// Deletes the user and their memberships. Fails if the user is the
    /// last admin of any team.
    fn delete(&self, id: i64) -> impl Future<Output = ResmanResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Teams & membership
// ---------------------------------------------------------------------------

pub trait TeamRepository: Send + Sync {
    /// Create a team and make `creator_id` its first admin participant.
    fn create(
        &self,
        input: CreateTeam,
        creator_id: i64,
    ) -> impl Future<Output = ResmanResult<Team>> + Send;
    fn get_by_id(&self, id: i64) -> impl Future<Output = ResmanResult<Team>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = ResmanResult<Team>> + Send;
    fn update(&self, id: i64, input: UpdateTeam)
    -> impl Future<Output = ResmanResult<Team>> + Send;
    /// Delete the team with its participants, projects, sections and
    /// resources in one transaction.
    fn delete(&self, id: i64) -> impl Future<Output = ResmanResult<()>> + Send;
    /// Teams the user participates in.
    fn list_for_user(
        &self,
        user_id: i64,
        query: ListQuery,
    ) -> impl Future<Output = ResmanResult<PaginatedResult<Team>>> + Send;
}

pub trait ParticipantRepository: Send + Sync {
    fn create(
        &self,
        input: CreateParticipant,
    ) -> impl Future<Output = ResmanResult<Participant>> + Send;
    fn get(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> impl Future<Output = ResmanResult<Participant>> + Send;
    fn list_by_team(
        &self,
        team_id: i64,
        pagination: Pagination,
    ) -> impl Future<Output = ResmanResult<PaginatedResult<Participant>>> + Send;
    /// Change the admin flag. Demoting the last admin fails.
    fn set_admin(
        &self,
        team_id: i64,
        user_id: i64,
        admin: bool,
    ) -> impl Future<Output = ResmanResult<Participant>> + Send;
    /// Remove a membership. Removing the last admin fails.
    fn delete(&self, team_id: i64, user_id: i64) -> impl Future<Output = ResmanResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

pub trait ProjectRepository: Send + Sync {
    fn create(&self, input: CreateProject) -> impl Future<Output = ResmanResult<Project>> + Send;
    fn get_by_id(&self, id: i64) -> impl Future<Output = ResmanResult<Project>> + Send;
    fn update(
        &self,
        id: i64,
        input: UpdateProject,
    ) -> impl Future<Output = ResmanResult<Project>> + Send;
    /// Delete the project with its sections and resources.
    fn delete(&self, id: i64) -> impl Future<Output = ResmanResult<()>> + Send;
    fn list_by_team(
        &self,
        team_id: i64,
        query: ListQuery,
    ) -> impl Future<Output = ResmanResult<PaginatedResult<Project>>> + Send;
}

pub trait SectionRepository: Send + Sync {
    fn create(&self, input: CreateSection) -> impl Future<Output = ResmanResult<Section>> + Send;
    fn get_by_id(&self, id: i64) -> impl Future<Output = ResmanResult<Section>> + Send;
    fn update(
        &self,
        id: i64,
        input: UpdateSection,
    ) -> impl Future<Output = ResmanResult<Section>> + Send;
    /// Delete the section with its resources.
    fn delete(&self, id: i64) -> impl Future<Output = ResmanResult<()>> + Send;
    fn list_by_project(
        &self,
        project_id: i64,
        query: ListQuery,
    ) -> impl Future<Output = ResmanResult<PaginatedResult<Section>>> + Send;
}

pub trait ResourceRepository: Send + Sync {
    fn create(&self, input: CreateResource)
    -> impl Future<Output = ResmanResult<Resource>> + Send;
    fn get_by_id(&self, id: i64) -> impl Future<Output = ResmanResult<Resource>> + Send;
    fn update(
        &self,
        id: i64,
        input: UpdateResource,
    ) -> impl Future<Output = ResmanResult<Resource>> + Send;
    fn delete(&self, id: i64) -> impl Future<Output = ResmanResult<()>> + Send;
    fn list_by_section(
        &self,
        section_id: i64,
        query: ListQuery,
    ) -> impl Future<Output = ResmanResult<PaginatedResult<Resource>>> + Send;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Every repository backed by one store, so services can be generic
/// over a single type parameter.
pub trait Store: Send + Sync + 'static {
    type Users: UserRepository;
    type Teams: TeamRepository;
    type Participants: ParticipantRepository;
    type Projects: ProjectRepository;
    type Sections: SectionRepository;
    type Resources: ResourceRepository;

    fn users(&self) -> &Self::Users;
    fn teams(&self) -> &Self::Teams;
    fn participants(&self) -> &Self::Participants;
    fn projects(&self) -> &Self::Projects;
    fn sections(&self) -> &Self::Sections;
    fn resources(&self) -> &Self::Resources;
}
