//! Paginated, filtered listing over one scope of the hierarchy.

use std::sync::Arc;

use resman_core::error::ResmanResult;
use resman_core::models::participant::Participant;
use resman_core::models::project::Project;
use resman_core::models::resource::Resource;
use resman_core::models::section::Section;
use resman_core::models::team::Team;
use resman_core::repository::{
    ListQuery, PaginatedResult, Pagination, ParticipantRepository, ProjectRepository,
    ResourceRepository, SectionRepository, Store, TeamRepository,
};
use serde::Deserialize;
use tracing::debug;

/// Default upper bound for `limit`.
pub const DEFAULT_MAX_LIMIT: u64 = 500;

/// Raw list parameters as a client supplies them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub filter: Option<String>,
}

impl ListParams {
    /// Normalize into a store query.
    ///
    /// Non-positive or absent `offset` is 0; non-positive or absent
    /// `limit` means unbounded; larger limits are clamped to `max_limit`.
    /// The filter is trimmed and lowercased, and blank means none.
    pub fn normalize(&self, max_limit: u64) -> ListQuery {
        let offset = self.offset.filter(|o| *o > 0).map_or(0, |o| o as u64);
        let limit = self
            .limit
            .filter(|l| *l > 0)
            .map(|l| (l as u64).min(max_limit));
        let filter = self
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);

        ListQuery {
            pagination: Pagination { offset, limit },
            filter,
        }
    }
}

pub struct ListingEngine<S: Store> {
    store: Arc<S>,
    max_limit: u64,
}

impl<S: Store> ListingEngine<S> {
    pub fn new(store: Arc<S>, max_limit: u64) -> Self {
        Self {
            store,
            max_limit: max_limit.max(1),
        }
    }

    fn query(&self, params: &ListParams) -> ListQuery {
        let query = params.normalize(self.max_limit);
        debug!(?query, "normalized list query");
        query
    }

    /// Teams the user participates in, filtered on `name`.
    pub async fn list_teams(
        &self,
        user_id: i64,
        params: &ListParams,
    ) -> ResmanResult<PaginatedResult<Team>> {
        self.store
            .teams()
            .list_for_user(user_id, self.query(params))
            .await
    }

    pub async fn list_projects(
        &self,
        team_id: i64,
        params: &ListParams,
    ) -> ResmanResult<PaginatedResult<Project>> {
        self.store
            .projects()
            .list_by_team(team_id, self.query(params))
            .await
    }

    pub async fn list_sections(
        &self,
        project_id: i64,
        params: &ListParams,
    ) -> ResmanResult<PaginatedResult<Section>> {
        self.store
            .sections()
            .list_by_project(project_id, self.query(params))
            .await
    }

    pub async fn list_resources(
        &self,
        section_id: i64,
        params: &ListParams,
    ) -> ResmanResult<PaginatedResult<Resource>> {
        self.store
            .resources()
            .list_by_section(section_id, self.query(params))
            .await
    }

    /// Members of a team. The filter does not apply.
    pub async fn list_participants(
        &self,
        team_id: i64,
        params: &ListParams,
    ) -> ResmanResult<PaginatedResult<Participant>> {
        self.store
            .participants()
            .list_by_team(team_id, self.query(params).pagination)
            .await
    }
}
