//! SurrealDB implementation of [`SectionRepository`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::section::{CreateSection, Section, UpdateSection};
use resman_core::repository::{ListQuery, PaginatedResult, SectionRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::CountRow;
use crate::error::DbError;
use crate::id::next_id;
use crate::query::{bounded, list_statements};

#[derive(Debug, SurrealValue)]
struct SectionRow {
    project_id: i64,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct SectionRowWithId {
    record_id: i64,
    project_id: i64,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SectionRow {
    fn into_section(self, id: i64) -> Section {
        Section {
            id,
            project_id: self.project_id,
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<SectionRowWithId> for Section {
    fn from(row: SectionRowWithId) -> Self {
        Section {
            id: row.record_id,
            project_id: row.project_id,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SurrealDB implementation of the Section repository.
#[derive(Clone)]
pub struct SurrealSectionRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealSectionRepository<C> {
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

impl<C: Connection> SectionRepository for SurrealSectionRepository<C> {
    async fn create(&self, input: CreateSection) -> ResmanResult<Section> {
        let id = next_id(&self.db, self.timeout).await?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('section', $id) SET \
                     project_id = $project_id, title = $title",
                )
                .bind(("id", id))
                .bind(("project_id", input.project_id))
                .bind(("title", input.title)),
        )
        .await?
        .check()
        .map_err(DbError::writing("section"))?;

        let rows: Vec<SectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "section".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_section(id))
    }

    async fn get_by_id(&self, id: i64) -> ResmanResult<Section> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT * FROM type::record('section', $id)")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<SectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "section".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_section(id))
    }

    async fn update(&self, id: i64, input: UpdateSection) -> ResmanResult<Section> {
        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('section', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id));
        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }

        let mut result = bounded(self.timeout, builder)
            .await?
            .check()
            .map_err(DbError::from_query)?;

        let rows: Vec<SectionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "section".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_section(id))
    }

    async fn delete(&self, id: i64) -> ResmanResult<()> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("DELETE type::record('section', $id) RETURN BEFORE")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<SectionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "section".into(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn list_by_project(
        &self,
        project_id: i64,
        query: ListQuery,
    ) -> ResmanResult<PaginatedResult<Section>> {
        let sql = list_statements("section", "project_id = $scope", Some("title"), &query);

        let mut result = bounded(
            self.timeout,
            self.db
                .query(&sql)
                .bind(("scope", project_id))
                .bind(("filter", query.filter.clone().unwrap_or_default()))
                .bind(("limit", query.pagination.limit.unwrap_or(0)))
                .bind(("offset", query.pagination.offset)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<SectionRowWithId> = result.take(1).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows.into_iter().map(Section::from).collect(),
            total,
            offset: query.pagination.offset,
            limit: query.pagination.limit,
        })
    }
}
