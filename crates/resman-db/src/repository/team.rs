//! SurrealDB implementation of [`TeamRepository`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::team::{CreateTeam, Team, UpdateTeam};
use resman_core::repository::{ListQuery, PaginatedResult, TeamRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use super::CountRow;
use crate::error::DbError;
use crate::id::next_id;
use crate::password::hash_password;
use crate::query::{bounded, list_statements};

#[derive(Debug, SurrealValue)]
struct TeamRow {
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TeamRowWithId {
    record_id: i64,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TeamRow {
    fn into_team(self, id: i64) -> Team {
        Team {
            id,
            name: self.name,
            password_hash: self.password_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<TeamRowWithId> for Team {
    fn from(row: TeamRowWithId) -> Self {
        Team {
            id: row.record_id,
            name: row.name,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SurrealDB implementation of the Team repository.
#[derive(Clone)]
pub struct SurrealTeamRepository<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
    timeout: Duration,
}

impl<C: Connection> SurrealTeamRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            db,
            pepper: None,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_pepper(mut self, pepper: Option<String>) -> Self {
        self.pepper = pepper;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<C: Connection> TeamRepository for SurrealTeamRepository<C> {
    async fn create(&self, input: CreateTeam, creator_id: i64) -> ResmanResult<Team> {
        let id = next_id(&self.db, self.timeout).await?;
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        // The `founding_admin` event adds the creator as admin inside this
        // statement, so a name clash or a missing creator aborts both.
        bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('team', $id) SET \
                     name = $name, password_hash = $password_hash, \
                     created_by = $creator_id",
                )
                .bind(("id", id))
                .bind(("name", input.name))
                .bind(("password_hash", password_hash))
                .bind(("creator_id", creator_id)),
        )
        .await?
        .check()
        .map_err(DbError::writing("team"))?;

        debug!(team_id = id, creator_id, "team created with founding admin");
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: i64) -> ResmanResult<Team> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT * FROM type::record('team', $id)")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<TeamRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "team".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_team(id))
    }

    async fn get_by_name(&self, name: &str) -> ResmanResult<Team> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT meta::id(id) AS record_id, * FROM team WHERE name = $name")
                .bind(("name", name.to_string())),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<TeamRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "team".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.into())
    }

    async fn update(&self, id: i64, input: UpdateTeam) -> ResmanResult<Team> {
        let password_hash = match input.password.as_deref() {
            Some(password) => Some(hash_password(password, self.pepper.as_deref())?),
            None => None,
        };

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('team', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(hash) = password_hash {
            builder = builder.bind(("password_hash", hash));
        }

        let mut result = bounded(self.timeout, builder)
            .await?
            .check()
            .map_err(DbError::from_query)?;

        let rows: Vec<TeamRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "team".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_team(id))
    }

    async fn delete(&self, id: i64) -> ResmanResult<()> {
        // Projects, sections, resources and participants are removed by
        // the cascade events inside this statement's transaction.
        let mut result = bounded(
            self.timeout,
            self.db
                .query("DELETE type::record('team', $id) RETURN BEFORE")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<TeamRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "team".into(),
                id: id.to_string(),
            }
            .into());
        }
        debug!(team_id = id, "team deleted with its hierarchy");
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        query: ListQuery,
    ) -> ResmanResult<PaginatedResult<Team>> {
        let sql = list_statements(
            "team",
            "meta::id(id) IN (SELECT VALUE team_id FROM participant WHERE user_id = $scope)",
            Some("name"),
            &query,
        );

        let mut result = bounded(
            self.timeout,
            self.db
                .query(&sql)
                .bind(("scope", user_id))
                .bind(("filter", query.filter.clone().unwrap_or_default()))
                .bind(("limit", query.pagination.limit.unwrap_or(0)))
                .bind(("offset", query.pagination.offset)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<TeamRowWithId> = result.take(1).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows.into_iter().map(Team::from).collect(),
            total,
            offset: query.pagination.offset,
            limit: query.pagination.limit,
        })
    }
}
