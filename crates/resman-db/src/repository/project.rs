//! SurrealDB implementation of [`ProjectRepository`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::project::{CreateProject, Project, UpdateProject};
use resman_core::repository::{ListQuery, PaginatedResult, ProjectRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::CountRow;
use crate::error::DbError;
use crate::id::next_id;
use crate::query::{bounded, list_statements};

#[derive(Debug, SurrealValue)]
struct ProjectRow {
    team_id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ProjectRowWithId {
    record_id: i64,
    team_id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(self, id: i64) -> Project {
        Project {
            id,
            team_id: self.team_id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<ProjectRowWithId> for Project {
    fn from(row: ProjectRowWithId) -> Self {
        Project {
            id: row.record_id,
            team_id: row.team_id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SurrealDB implementation of the Project repository.
#[derive(Clone)]
pub struct SurrealProjectRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealProjectRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            db,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<C: Connection> ProjectRepository for SurrealProjectRepository<C> {
    async fn create(&self, input: CreateProject) -> ResmanResult<Project> {
        let id = next_id(&self.db, self.timeout).await?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('project', $id) SET \
                     team_id = $team_id, name = $name",
                )
                .bind(("id", id))
                .bind(("team_id", input.team_id))
                .bind(("name", input.name)),
        )
        .await?
        .check()
        .map_err(DbError::writing("project"))?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_project(id))
    }

    async fn get_by_id(&self, id: i64) -> ResmanResult<Project> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT * FROM type::record('project', $id)")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_project(id))
    }

    async fn update(&self, id: i64, input: UpdateProject) -> ResmanResult<Project> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('project', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }

        let mut result = bounded(self.timeout, builder)
            .await?
            .check()
            .map_err(DbError::from_query)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_project(id))
    }

    async fn delete(&self, id: i64) -> ResmanResult<()> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("DELETE type::record('project', $id) RETURN BEFORE")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "project".into(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn list_by_team(
        &self,
        team_id: i64,
        query: ListQuery,
    ) -> ResmanResult<PaginatedResult<Project>> {
        let sql = list_statements("project", "team_id = $scope", Some("name"), &query);

        let mut result = bounded(
            self.timeout,
            self.db
                .query(&sql)
                .bind(("scope", team_id))
                .bind(("filter", query.filter.clone().unwrap_or_default()))
                .bind(("limit", query.pagination.limit.unwrap_or(0)))
                .bind(("offset", query.pagination.offset)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<ProjectRowWithId> = result.take(1).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows.into_iter().map(Project::from).collect(),
            total,
            offset: query.pagination.offset,
            limit: query.pagination.limit,
        })
    }
}
