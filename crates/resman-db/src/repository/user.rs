//! SurrealDB implementation of [`UserRepository`].
//!
//! Emails are stored lowercased; uniqueness is enforced by the
//! `idx_user_email` index. Password hashes are produced here, never
//! accepted from callers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::user::{CreateUser, UpdateUser, User};
use resman_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;
use crate::id::next_id;
use crate::password::hash_password;
use crate::query::bounded;

/// DB-side row struct for queries where the key is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    email: String,
    password_hash: Option<String>,
    oauth_subject: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record key via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: i64,
    username: String,
    email: String,
    password_hash: Option<String>,
    oauth_subject: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: i64) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            oauth_subject: self.oauth_subject,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<UserRowWithId> for User {
    fn from(row: UserRowWithId) -> Self {
        User {
            id: row.record_id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            oauth_subject: row.oauth_subject,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
    timeout: Duration,
}

impl<C: Connection> SurrealUserRepository<C> {
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

    async fn find_one(&self, field: &'static str, value: String) -> ResmanResult<User> {
        let query = format!("SELECT meta::id(id) AS record_id, * FROM user WHERE {field} = $value");
        let mut result = bounded(self.timeout, self.db.query(&query).bind(("value", value.clone())))
            .await?
            .check()
            .map_err(DbError::from_query)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("{field}={value}"),
        })?;

        Ok(row.into())
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> ResmanResult<User> {
        let id = next_id(&self.db, self.timeout).await?;
        let password_hash = match input.password.as_deref() {
            Some(password) => Some(hash_password(password, self.pepper.as_deref())?),
            None => None,
        };

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('user', $id) SET \
                     username = $username, email = $email, \
                     password_hash = $password_hash, \
                     oauth_subject = $oauth_subject",
                )
                .bind(("id", id))
                .bind(("username", input.username))
                .bind(("email", normalize_email(&input.email)))
                .bind(("password_hash", password_hash))
                .bind(("oauth_subject", input.oauth_subject)),
        )
        .await?
        .check()
        .map_err(DbError::writing("user"))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_id(&self, id: i64) -> ResmanResult<User> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT * FROM type::record('user', $id)")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_email(&self, email: &str) -> ResmanResult<User> {
        self.find_one("email", normalize_email(email)).await
    }

    async fn get_by_oauth_subject(&self, subject: &str) -> ResmanResult<User> {
        self.find_one("oauth_subject", subject.to_string()).await
    }

    async fn update(&self, id: i64, input: UpdateUser) -> ResmanResult<User> {
        let password_hash = match input.password.as_deref() {
            Some(password) => Some(hash_password(password, self.pepper.as_deref())?),
            None => None,
        };

        let mut sets = Vec::new();
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id));
        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", normalize_email(&email)));
        }
        if let Some(hash) = password_hash {
            builder = builder.bind(("password_hash", hash));
        }

        let mut result = bounded(self.timeout, builder)
            .await?
            .check()
            .map_err(DbError::from_query)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_user(id))
    }

    async fn delete(&self, id: i64) -> ResmanResult<()> {
        // Memberships go with the user via the `cascade_user` event; the
        // last-admin guard aborts the whole statement if needed.
        let mut result = bounded(
            self.timeout,
            self.db
                .query("DELETE type::record('user', $id) RETURN BEFORE")
                .bind(("id", id)),
        )
        .await?
        .check()
        .map_err(DbError::from_query)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
