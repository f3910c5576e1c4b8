//! Hierarchy service: CRUD over teams, projects, sections, resources
//! and participants, plus account self-management.
//!
//! The service validates input and delegates to the store; invariants
//! that need atomicity (cascades, uniqueness, parent existence, the
//! last-admin guard) are enforced by the repositories. Authorization is
//! the caller's job, through the gate.

use std::sync::Arc;

use resman_auth::password;
use resman_core::error::{ResmanError, ResmanResult};
use resman_core::models::participant::{CreateParticipant, Participant};
use resman_core::models::project::{CreateProject, Project, UpdateProject};
use resman_core::models::resource::{CreateResource, Resource, UpdateResource};
use resman_core::models::section::{CreateSection, Section, UpdateSection};
use resman_core::models::team::{CreateTeam, Team, UpdateTeam};
use resman_core::models::user::{UpdateUser, User};
use resman_core::repository::{
    ParticipantRepository, ProjectRepository, ResourceRepository, SectionRepository, Store,
    TeamRepository, UserRepository,
};
use resman_core::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, ValidationErrors, Validator};
use tracing::{info, instrument};

/// Settings the service needs beyond the store.
#[derive(Debug, Clone)]
pub struct HierarchyConfig {
    /// Must match the pepper the store hashes with.
    pub pepper: Option<String>,
    pub min_password_length: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            pepper: None,
            min_password_length: 8,
        }
    }
}

fn empty_patch() -> ResmanError {
    ValidationErrors::single("body", "at least one field must be supplied").into()
}

/// `link` must be an http(s) URL; an empty value is allowed only where
/// it means "clear".
fn check_link(v: &mut Validator, link: Option<&str>) {
    if let Some(link) = link.filter(|l| !l.is_empty()) {
        v.link("link", link);
    }
}

fn check_notes(v: &mut Validator, notes: Option<&str>) {
    if let Some(notes) = notes {
        if notes.chars().count() > MAX_TEXT_LEN {
            v.violation("notes", format!("must be at most {MAX_TEXT_LEN} characters"));
        }
    }
}

/// Validate a new resource without persisting it. Shared with the bulk
/// importer so a CSV row obeys the same rules as a single create.
pub fn validate_resource(input: &CreateResource) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.positive_id("section_id", input.section_id)
        .text("title", &input.title, MAX_NAME_LEN);
    check_link(&mut v, input.link.as_deref());
    check_notes(&mut v, input.notes.as_deref());
    v.finish()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    trimmed(value).filter(|v| !v.is_empty())
}

pub struct HierarchyService<S: Store> {
    store: Arc<S>,
    config: HierarchyConfig,
}

impl<S: Store> HierarchyService<S> {
    pub fn new(store: Arc<S>, config: HierarchyConfig) -> Self {
        Self { store, config }
    }

    // -------------------------------------------------------------------
    // Teams
    // -------------------------------------------------------------------

    /// Create a team with `creator_id` as its first admin.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_team(&self, creator_id: i64, input: CreateTeam) -> ResmanResult<Team> {
        Validator::new()
            .text("name", &input.name, MAX_NAME_LEN)
            .password("password", &input.password, self.config.min_password_length)
            .finish()?;

        let team = self
            .store
            .teams()
            .create(
                CreateTeam {
                    name: input.name.trim().to_string(),
                    password: input.password,
                },
                creator_id,
            )
            .await?;
        info!(team_id = team.id, creator_id, "team created");
        Ok(team)
    }

    pub async fn get_team(&self, id: i64) -> ResmanResult<Team> {
        self.store.teams().get_by_id(id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_team(&self, id: i64, input: UpdateTeam) -> ResmanResult<Team> {
        if input.is_empty() {
            return Err(empty_patch());
        }
        let mut v = Validator::new();
        v.optional_text("name", input.name.as_deref(), MAX_NAME_LEN);
        if let Some(password) = input.password.as_deref() {
            v.password("password", password, self.config.min_password_length);
        }
        v.finish()?;

        self.store
            .teams()
            .update(
                id,
                UpdateTeam {
                    name: trimmed(input.name),
                    password: input.password,
                },
            )
            .await
    }

    /// Delete a team with its whole hierarchy and memberships.
    #[instrument(skip(self))]
    pub async fn delete_team(&self, id: i64) -> ResmanResult<()> {
        self.store.teams().delete(id).await?;
        info!(team_id = id, "team deleted");
        Ok(())
    }

    /// Verify a team's name and password and return its id.
    ///
    /// An unknown name and a wrong password are indistinguishable.
    #[instrument(skip(self, password))]
    pub async fn join_team(&self, name: &str, password: &str) -> ResmanResult<i64> {
        let team = match self.store.teams().get_by_name(name.trim()).await {
            Ok(team) => Some(team),
            Err(ResmanError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        password::verify_credentials(
            password,
            team.as_ref().map(|t| t.password_hash.as_str()),
            self.config.pepper.as_deref(),
        )?;

        team.map(|t| t.id).ok_or(ResmanError::InvalidCredentials)
    }

    /// Verify the team credentials and enroll `user_id` as a member.
    ///
    /// Joining a team the user already belongs to is a `Conflict`.
    pub async fn join_team_as(
        &self,
        user_id: i64,
        name: &str,
        password: &str,
    ) -> ResmanResult<Participant> {
        let team_id = self.join_team(name, password).await?;
        let participant = self
            .store
            .participants()
            .create(CreateParticipant {
                user_id,
                team_id,
                admin: false,
            })
            .await?;
        info!(team_id, user_id, "user joined team");
        Ok(participant)
    }

    // -------------------------------------------------------------------
    // Participants
    // -------------------------------------------------------------------

    #[instrument(skip(self, input))]
    pub async fn add_participant(&self, input: CreateParticipant) -> ResmanResult<Participant> {
        Validator::new()
            .positive_id("user_id", input.user_id)
            .positive_id("team_id", input.team_id)
            .finish()?;
        self.store.participants().create(input).await
    }

    pub async fn get_participant(&self, team_id: i64, user_id: i64) -> ResmanResult<Participant> {
        self.store.participants().get(team_id, user_id).await
    }

    /// Change a member's admin flag. Demoting the last admin fails.
    #[instrument(skip(self))]
    pub async fn update_participant(
        &self,
        team_id: i64,
        user_id: i64,
        admin: bool,
    ) -> ResmanResult<Participant> {
        self.store
            .participants()
            .set_admin(team_id, user_id, admin)
            .await
    }

    /// Remove a member. Removing the last admin fails.
    #[instrument(skip(self))]
    pub async fn remove_participant(&self, team_id: i64, user_id: i64) -> ResmanResult<()> {
        self.store.participants().delete(team_id, user_id).await?;
        info!(team_id, user_id, "participant removed");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------

    pub async fn create_project(&self, input: CreateProject) -> ResmanResult<Project> {
        Validator::new()
            .positive_id("team_id", input.team_id)
            .text("name", &input.name, MAX_NAME_LEN)
            .finish()?;
        self.store
            .projects()
            .create(CreateProject {
                team_id: input.team_id,
                name: input.name.trim().to_string(),
            })
            .await
    }

    pub async fn get_project(&self, id: i64) -> ResmanResult<Project> {
        self.store.projects().get_by_id(id).await
    }

    pub async fn update_project(&self, id: i64, input: UpdateProject) -> ResmanResult<Project> {
        if input.name.is_none() {
            return Err(empty_patch());
        }
        Validator::new()
            .optional_text("name", input.name.as_deref(), MAX_NAME_LEN)
            .finish()?;
        self.store
            .projects()
            .update(
                id,
                UpdateProject {
                    name: trimmed(input.name),
                },
            )
            .await
    }

    pub async fn delete_project(&self, id: i64) -> ResmanResult<()> {
        self.store.projects().delete(id).await
    }

    // -------------------------------------------------------------------
    // Sections
    // -------------------------------------------------------------------

    pub async fn create_section(&self, input: CreateSection) -> ResmanResult<Section> {
        Validator::new()
            .positive_id("project_id", input.project_id)
            .text("title", &input.title, MAX_NAME_LEN)
            .finish()?;
        self.store
            .sections()
            .create(CreateSection {
                project_id: input.project_id,
                title: input.title.trim().to_string(),
            })
            .await
    }

    pub async fn get_section(&self, id: i64) -> ResmanResult<Section> {
        self.store.sections().get_by_id(id).await
    }

    pub async fn update_section(&self, id: i64, input: UpdateSection) -> ResmanResult<Section> {
        if input.title.is_none() {
            return Err(empty_patch());
        }
        Validator::new()
            .optional_text("title", input.title.as_deref(), MAX_NAME_LEN)
            .finish()?;
        self.store
            .sections()
            .update(
                id,
                UpdateSection {
                    title: trimmed(input.title),
                },
            )
            .await
    }

    pub async fn delete_section(&self, id: i64) -> ResmanResult<()> {
        self.store.sections().delete(id).await
    }

    // -------------------------------------------------------------------
    // Resources
    // -------------------------------------------------------------------

    pub async fn create_resource(&self, input: CreateResource) -> ResmanResult<Resource> {
        validate_resource(&input)?;
        self.store
            .resources()
            .create(CreateResource {
                title: input.title.trim().to_string(),
                link: non_blank(input.link),
                notes: input.notes.filter(|n| !n.trim().is_empty()),
                ..input
            })
            .await
    }

    pub async fn get_resource(&self, id: i64) -> ResmanResult<Resource> {
        self.store.resources().get_by_id(id).await
    }

    pub async fn update_resource(&self, id: i64, input: UpdateResource) -> ResmanResult<Resource> {
        if input.is_empty() {
            return Err(empty_patch());
        }
        let mut v = Validator::new();
        v.optional_text("title", input.title.as_deref(), MAX_NAME_LEN);
        check_link(&mut v, input.link.as_deref());
        check_notes(&mut v, input.notes.as_deref());
        v.finish()?;

        self.store
            .resources()
            .update(
                id,
                UpdateResource {
                    title: trimmed(input.title),
                    link: trimmed(input.link),
                    ..input
                },
            )
            .await
    }

    pub async fn delete_resource(&self, id: i64) -> ResmanResult<()> {
        self.store.resources().delete(id).await
    }

    // -------------------------------------------------------------------
    // Scope resolution
    // -------------------------------------------------------------------

    pub async fn team_of_project(&self, project_id: i64) -> ResmanResult<i64> {
        Ok(self.store.projects().get_by_id(project_id).await?.team_id)
    }

    pub async fn team_of_section(&self, section_id: i64) -> ResmanResult<i64> {
        let section = self.store.sections().get_by_id(section_id).await?;
        self.team_of_project(section.project_id).await
    }

    pub async fn team_of_resource(&self, resource_id: i64) -> ResmanResult<i64> {
        let resource = self.store.resources().get_by_id(resource_id).await?;
        self.team_of_section(resource.section_id).await
    }

    // -------------------------------------------------------------------
    // Accounts
    // -------------------------------------------------------------------

    pub async fn get_user(&self, id: i64) -> ResmanResult<User> {
        self.store.users().get_by_id(id).await
    }

    pub async fn update_user(&self, id: i64, input: UpdateUser) -> ResmanResult<User> {
        if input.is_empty() {
            return Err(empty_patch());
        }
        let mut v = Validator::new();
        v.optional_text("username", input.username.as_deref(), MAX_NAME_LEN);
        if let Some(email) = input.email.as_deref() {
            v.email("email", email);
        }
        if let Some(password) = input.password.as_deref() {
            v.password("password", password, self.config.min_password_length);
        }
        v.finish()?;

        self.store
            .users()
            .update(
                id,
                UpdateUser {
                    username: trimmed(input.username),
                    email: trimmed(input.email),
                    password: input.password,
                },
            )
            .await
    }

    /// Delete the account and its memberships. Rejected while the user
    /// is the last admin of any team.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> ResmanResult<()> {
        self.store.users().delete(id).await?;
        info!(user_id = id, "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use resman_core::models::resource::ResourceStatus;

    use super::*;

    fn resource(title: &str, link: Option<&str>) -> CreateResource {
        CreateResource {
            section_id: 1,
            title: title.into(),
            status: ResourceStatus::Todo,
            link: link.map(Into::into),
            notes: None,
        }
    }

    #[test]
    fn resource_validation_accepts_http_links() {
        assert!(validate_resource(&resource("Design doc", Some("https://example.com"))).is_ok());
        assert!(validate_resource(&resource("Design doc", None)).is_ok());
        assert!(validate_resource(&resource("Design doc", Some(""))).is_ok());
    }

    #[test]
    fn resource_validation_reports_title_and_link() {
        let err = validate_resource(&resource("", Some("mailto:ada@example.com"))).unwrap_err();
        let fields: Vec<_> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["title", "link"]);
    }

    #[test]
    fn overlong_notes_are_rejected() {
        let mut input = resource("Design doc", None);
        input.notes = Some("n".repeat(MAX_TEXT_LEN + 1));
        let err = validate_resource(&input).unwrap_err();
        assert_eq!(err.violations[0].field, "notes");
    }
}
