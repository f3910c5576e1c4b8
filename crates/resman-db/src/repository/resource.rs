//! SurrealDB implementation of [`ResourceRepository`].
//!
//! Status is stored as its snake_case name. In an update an empty `link`
//! or `notes` clears the field.

use std::time::Duration;

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::resource::{CreateResource, Resource, ResourceStatus, UpdateResource};
use resman_core::repository::{ListQuery, PaginatedResult, ResourceRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::CountRow;
use crate::error::DbError;
use crate::id::next_id;
use crate::query::{bounded, list_statements};

#[derive(Debug, SurrealValue)]
struct ResourceRow {
    section_id: i64,
    title: String,
    status: String,
    link: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ResourceRowWithId {
    record_id: i64,
    section_id: i64,
    title: String,
    status: String,
    link: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<ResourceStatus, DbError> {
    s.parse()
        .map_err(|e| DbError::Query(format!("stored resource status: {e}")))
}

impl ResourceRow {
    fn into_resource(self, id: i64) -> Result<Resource, DbError> {
        Ok(Resource {
            id,
            section_id: self.section_id,
            title: self.title,
            status: parse_status(&self.status)?,
            link: self.link,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ResourceRowWithId {
    fn try_into_resource(self) -> Result<Resource, DbError> {
        Ok(Resource {
            id: self.record_id,
            section_id: self.section_id,
            title: self.title,
            status: parse_status(&self.status)?,
            link: self.link,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// `Some("")` clears, `Some(v)` sets, `None` leaves the field alone.
fn optional_set(field: &'static str, value: &Option<String>) -> Option<String> {
    match value.as_deref() {
        None => None,
        Some("") => Some(format!("{field} = NONE")),
        Some(_) => Some(format!("{field} = ${field}")),
    }
}

/// SurrealDB implementation of the Resource repository.
#[derive(Clone)]
pub struct SurrealResourceRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealResourceRepository<C> {
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

impl<C: Connection> ResourceRepository for SurrealResourceRepository<C> {
    async fn create(&self, input: CreateResource) -> ResmanResult<Resource> {
        let id = next_id(&self.db, self.timeout).await?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('resource', $id) SET \
                     section_id = $section_id, title = $title, \
                     status = $status, link = $link, notes = $notes",
                )
                .bind(("id", id))
                .bind(("section_id", input.section_id))
                .bind(("title", input.title))
                .bind(("status", input.status.as_str().to_string()))
                .bind(("link", input.link.filter(|l| !l.is_empty())))
                .bind(("notes", input.notes.filter(|n| !n.is_empty()))),
        )
        .await?
        .check()
        .map_err(DbError::writing("resource"))?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_resource(id)?)
    }

    async fn get_by_id(&self, id: i64) -> ResmanResult<Resource> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT * FROM type::record('resource', $id)")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_resource(id)?)
    }

    async fn update(&self, id: i64, input: UpdateResource) -> ResmanResult<Resource> {
        let mut sets: Vec<String> = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title".into());
        }
        if input.status.is_some() {
            sets.push("status = $status".into());
        }
        sets.extend(optional_set("link", &input.link));
        sets.extend(optional_set("notes", &input.notes));
        sets.push("updated_at = time::now()".into());

        let query = format!(
            "UPDATE type::record('resource', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id));
        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(link) = input.link.filter(|l| !l.is_empty()) {
            builder = builder.bind(("link", link));
        }
        if let Some(notes) = input.notes.filter(|n| !n.is_empty()) {
            builder = builder.bind(("notes", notes));
        }

        let mut result = bounded(self.timeout, builder)
            .await?
            .check()
            .map_err(DbError::from_query)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_resource(id)?)
    }

    async fn delete(&self, id: i64) -> ResmanResult<()> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("DELETE type::record('resource', $id) RETURN BEFORE")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "resource".into(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn list_by_section(
        &self,
        section_id: i64,
        query: ListQuery,
    ) -> ResmanResult<PaginatedResult<Resource>> {
        let sql = list_statements("resource", "section_id = $scope", Some("title"), &query);

        let mut result = bounded(
            self.timeout,
            self.db
                .query(&sql)
                .bind(("scope", section_id))
                .bind(("filter", query.filter.clone().unwrap_or_default()))
                .bind(("limit", query.pagination.limit.unwrap_or(0)))
                .bind(("offset", query.pagination.offset)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<ResourceRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_resource())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: query.pagination.offset,
            limit: query.pagination.limit,
        })
    }
}
