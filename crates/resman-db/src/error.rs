//! Database-specific error types and conversions.

use resman_core::error::ResmanError;

use crate::schema::LAST_ADMIN_MARKER;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated on {entity}")]
    Conflict { entity: String },

    #[error("{0}")]
    Rule(String),

    #[error("Concurrent write to the same records")]
    Contention,

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Store operation timed out")]
    Timeout,
}

impl DbError {
    /// Classify a statement-level error returned by `Response::check`.
    pub(crate) fn from_query(err: surrealdb::Error) -> Self {
        classify(&err.to_string())
    }

    /// Like [`DbError::from_query`] for a create of `entity`: losing a
    /// write race is reported as a conflict on that entity.
    pub(crate) fn writing(entity: &'static str) -> impl FnOnce(surrealdb::Error) -> Self {
        move |err| Self::from_query(err).on(entity)
    }

    fn on(self, entity: &str) -> Self {
        match self {
            DbError::Contention => DbError::Conflict {
                entity: entity.to_string(),
            },
            other => other,
        }
    }
}

fn classify(message: &str) -> DbError {
    if message.contains(LAST_ADMIN_MARKER) {
        return DbError::Rule("a team must keep at least one admin".into());
    }

    if message.contains("already contains") {
        if let Some(index) = between(message, "index `", "`") {
            return DbError::Conflict {
                entity: entity_of_index(index).to_string(),
            };
        }
    }

    // Parent existence is a field ASSERT on every `<parent>_id` column.
    if message.contains("must conform to") {
        if let Some(entity) = between(message, "for field `", "`")
            .and_then(|field| field.strip_suffix("_id"))
        {
            return DbError::NotFound {
                entity: entity.to_string(),
                id: between(message, "Found ", " for field")
                    .unwrap_or("?")
                    .to_string(),
            };
        }
    }

    if message.contains("already exists") {
        if let Some(record) = between(message, "record `", "`") {
            let entity = record.split(':').next().unwrap_or(record);
            return DbError::Conflict {
                entity: entity.to_string(),
            };
        }
    }

    let lowered = message.to_lowercase();
    if lowered.contains("resource busy")
        || (lowered.contains("conflict") && lowered.contains("retried"))
    {
        return DbError::Contention;
    }

    DbError::Query(message.to_string())
}

/// Text between the first `start` and the following `end`.
fn between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let len = haystack[from..].find(end)?;
    Some(&haystack[from..from + len])
}

/// `idx_team_name` -> `team`.
fn entity_of_index(index: &str) -> &str {
    let name = index.strip_prefix("idx_").unwrap_or(index);
    name.split('_').next().unwrap_or(name)
}

impl From<DbError> for ResmanError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ResmanError::NotFound { entity, id },
            DbError::Conflict { entity } => ResmanError::Conflict { entity },
            DbError::Rule(message) => ResmanError::RuleViolation { message },
            DbError::Contention => ResmanError::Conflict {
                entity: "record".into(),
            },
            DbError::Timeout => ResmanError::Timeout,
            DbError::Hash(msg) => ResmanError::Internal(msg),
            other => ResmanError::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_index_violation_is_a_conflict() {
        let err = classify(
            "Database index `idx_team_name` already contains 'Platform', \
             with record `team:17`",
        );
        assert!(matches!(err, DbError::Conflict { entity } if entity == "team"));
    }

    #[test]
    fn composite_index_names_the_table() {
        let err = classify(
            "Database index `idx_participant_pair` already contains [3, 9], \
             with record `participant:4`",
        );
        assert!(matches!(err, DbError::Conflict { entity } if entity == "participant"));
    }

    #[test]
    fn failed_parent_assertion_is_not_found() {
        let err = classify(
            "Found 42 for field `team_id`, with record `project:7`, but field \
             must conform to: record::exists(type::record('team', $value))",
        );
        match err {
            DbError::NotFound { entity, id } => {
                assert_eq!(entity, "team");
                assert_eq!(id, "42");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn guard_marker_is_a_rule_violation() {
        let err = classify("An error occurred: resman:last_admin");
        assert!(matches!(err, DbError::Rule(_)));
    }

    #[test]
    fn commit_contention_is_reported_as_conflict() {
        let err = classify(
            "Failed to commit transaction due to a read or write conflict. \
             This transaction can be retried",
        );
        let core: ResmanError = err.into();
        assert_eq!(core.kind(), "conflict");
    }

    #[test]
    fn lost_write_race_names_the_entity() {
        let err = classify(
            "Failed to commit transaction due to a read or write conflict. \
             This transaction can be retried",
        )
        .on("participant");
        let core: ResmanError = err.into();
        match core {
            ResmanError::Conflict { entity } => assert_eq!(entity, "participant"),
            other => panic!("expected Conflict, got {other:?}"),
        }

        let unrelated = classify("Parse error: unexpected token").on("participant");
        assert!(matches!(unrelated, DbError::Query(_)));
    }

    #[test]
    fn unknown_errors_stay_query_errors() {
        let err = classify("Parse error: unexpected token");
        assert!(matches!(err, DbError::Query(_)));
    }

    #[test]
    fn converts_to_core_error() {
        let core: ResmanError = DbError::Conflict {
            entity: "team".into(),
        }
        .into();
        assert_eq!(core.kind(), "conflict");

        let core: ResmanError = DbError::Timeout.into();
        assert_eq!(core.kind(), "timeout");

        let core: ResmanError = DbError::Query("boom".into()).into();
        assert!(!core.is_client_safe());
    }
}
