//! SurrealDB implementation of [`ParticipantRepository`].
//!
//! Memberships are addressed by `(team_id, user_id)`; the pair is unique
//! through `idx_participant_pair`. Demoting or removing the last admin is
//! rejected by the `guard_last_admin` event.

use std::time::Duration;

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::participant::{CreateParticipant, Participant};
use resman_core::repository::{ListQuery, PaginatedResult, Pagination, ParticipantRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use super::CountRow;
use crate::error::DbError;
use crate::id::next_id;
use crate::query::{bounded, list_statements};

#[derive(Debug, SurrealValue)]
struct ParticipantRow {
    user_id: i64,
    team_id: i64,
    admin: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ParticipantRowWithId {
    record_id: i64,
    user_id: i64,
    team_id: i64,
    admin: bool,
    created_at: DateTime<Utc>,
}

impl ParticipantRow {
    fn into_participant(self, id: i64) -> Participant {
        Participant {
            id,
            user_id: self.user_id,
            team_id: self.team_id,
            admin: self.admin,
            created_at: self.created_at,
        }
    }
}

impl From<ParticipantRowWithId> for Participant {
    fn from(row: ParticipantRowWithId) -> Self {
        Participant {
            id: row.record_id,
            user_id: row.user_id,
            team_id: row.team_id,
            admin: row.admin,
            created_at: row.created_at,
        }
    }
}

fn not_found(team_id: i64, user_id: i64) -> DbError {
    DbError::NotFound {
        entity: "participant".into(),
        id: format!("team={team_id},user={user_id}"),
    }
}

/// SurrealDB implementation of the Participant repository.
#[derive(Clone)]
pub struct SurrealParticipantRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealParticipantRepository<C> {
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

impl<C: Connection> ParticipantRepository for SurrealParticipantRepository<C> {
    async fn create(&self, input: CreateParticipant) -> ResmanResult<Participant> {
        let id = next_id(&self.db, self.timeout).await?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('participant', $id) SET \
                     user_id = $user_id, team_id = $team_id, admin = $admin",
                )
                .bind(("id", id))
                .bind(("user_id", input.user_id))
                .bind(("team_id", input.team_id))
                .bind(("admin", input.admin)),
        )
        .await?
        .check()
        .map_err(DbError::writing("participant"))?;

        let rows: Vec<ParticipantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "participant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_participant(id))
    }

    async fn get(&self, team_id: i64, user_id: i64) -> ResmanResult<Participant> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT meta::id(id) AS record_id, * FROM participant \
                     WHERE team_id = $team_id AND user_id = $user_id",
                )
                .bind(("team_id", team_id))
                .bind(("user_id", user_id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<ParticipantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| not_found(team_id, user_id))?;

        Ok(row.into())
    }

    async fn list_by_team(
        &self,
        team_id: i64,
        pagination: Pagination,
    ) -> ResmanResult<PaginatedResult<Participant>> {
        let query = ListQuery {
            pagination,
            filter: None,
        };
        let sql = list_statements("participant", "team_id = $scope", None, &query);

        let mut result = bounded(
            self.timeout,
            self.db
                .query(&sql)
                .bind(("scope", team_id))
                .bind(("limit", query.pagination.limit.unwrap_or(0)))
                .bind(("offset", query.pagination.offset)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<ParticipantRowWithId> = result.take(1).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows.into_iter().map(Participant::from).collect(),
            total,
            offset: query.pagination.offset,
            limit: query.pagination.limit,
        })
    }

    async fn set_admin(&self, team_id: i64, user_id: i64, admin: bool) -> ResmanResult<Participant> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE participant SET admin = $admin \
                     WHERE team_id = $team_id AND user_id = $user_id; \
                     SELECT meta::id(id) AS record_id, * FROM participant \
                     WHERE team_id = $team_id AND user_id = $user_id;",
                )
                .bind(("team_id", team_id))
                .bind(("user_id", user_id))
                .bind(("admin", admin)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<ParticipantRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| not_found(team_id, user_id))?;

        Ok(row.into())
    }

    async fn delete(&self, team_id: i64, user_id: i64) -> ResmanResult<()> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "DELETE participant \
                     WHERE team_id = $team_id AND user_id = $user_id \
                     RETURN BEFORE",
                )
                .bind(("team_id", team_id))
                .bind(("user_id", user_id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<ParticipantRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(not_found(team_id, user_id).into());
        }
        Ok(())
    }
}
