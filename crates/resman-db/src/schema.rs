//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! Record keys are 64-bit integers drawn from the `record_key` sequence
//! by [`crate::id::next_id`].
//!
//! Hierarchy invariants live in the schema so that each mutation is a
//! single statement, and therefore a single store transaction:
//! - parent existence is a field `ASSERT`,
//! - cascading deletes and the last-admin guard are table events,
//! - uniqueness is a `UNIQUE` index.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "shared_keys_and_founding_admin",
        sql: SCHEMA_V2,
    },
];

/// Marker thrown by the last-admin guard event.
pub(crate) const LAST_ADMIN_MARKER: &str = "resman:last_admin";

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE option<string>;
DEFINE FIELD oauth_subject ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_oauth_subject ON TABLE user COLUMNS oauth_subject;

-- =======================================================================
-- Teams
-- =======================================================================
DEFINE TABLE team SCHEMAFULL;
DEFINE FIELD name ON TABLE team TYPE string;
DEFINE FIELD password_hash ON TABLE team TYPE string;
DEFINE FIELD created_at ON TABLE team TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE team TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_team_name ON TABLE team COLUMNS name UNIQUE;

-- =======================================================================
-- Participants (team membership)
-- =======================================================================
DEFINE TABLE participant SCHEMAFULL;
DEFINE FIELD user_id ON TABLE participant TYPE int \
    ASSERT record::exists(type::record('user', $value));
DEFINE FIELD team_id ON TABLE participant TYPE int \
    ASSERT record::exists(type::record('team', $value));
DEFINE FIELD admin ON TABLE participant TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE participant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_participant_pair ON TABLE participant \
    COLUMNS user_id, team_id UNIQUE;
DEFINE INDEX idx_participant_team ON TABLE participant COLUMNS team_id;

-- =======================================================================
-- Projects (team scope)
-- =======================================================================
DEFINE TABLE project SCHEMAFULL;
DEFINE FIELD team_id ON TABLE project TYPE int \
    ASSERT record::exists(type::record('team', $value));
DEFINE FIELD name ON TABLE project TYPE string;
DEFINE FIELD created_at ON TABLE project TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE project TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_project_team ON TABLE project COLUMNS team_id;

-- =======================================================================
-- Sections (project scope)
-- =======================================================================
DEFINE TABLE section SCHEMAFULL;
DEFINE FIELD project_id ON TABLE section TYPE int \
    ASSERT record::exists(type::record('project', $value));
DEFINE FIELD title ON TABLE section TYPE string;
DEFINE FIELD created_at ON TABLE section TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE section TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_section_project ON TABLE section COLUMNS project_id;

-- =======================================================================
-- Resources (section scope)
-- =======================================================================
DEFINE TABLE resource SCHEMAFULL;
DEFINE FIELD section_id ON TABLE resource TYPE int \
    ASSERT record::exists(type::record('section', $value));
DEFINE FIELD title ON TABLE resource TYPE string;
DEFINE FIELD status ON TABLE resource TYPE string \
    ASSERT $value IN ['todo', 'in_progress', 'done'];
DEFINE FIELD link ON TABLE resource TYPE option<string>;
DEFINE FIELD notes ON TABLE resource TYPE option<string>;
DEFINE FIELD created_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resource_section ON TABLE resource COLUMNS section_id;

-- =======================================================================
-- Cascading deletes
-- =======================================================================
DEFINE EVENT cascade_team ON TABLE team WHEN $event = 'DELETE' THEN {
    DELETE project WHERE team_id = meta::id($before.id);
    DELETE participant WHERE team_id = meta::id($before.id);
};
DEFINE EVENT cascade_project ON TABLE project WHEN $event = 'DELETE' THEN {
    DELETE section WHERE project_id = meta::id($before.id);
};
DEFINE EVENT cascade_section ON TABLE section WHEN $event = 'DELETE' THEN {
    DELETE resource WHERE section_id = meta::id($before.id);
};
DEFINE EVENT cascade_user ON TABLE user WHEN $event = 'DELETE' THEN {
    DELETE participant WHERE user_id = meta::id($before.id);
};

-- =======================================================================
-- Parent touch on child creation
--
-- Writing the parent record puts a child insert and a concurrent parent
-- delete in write conflict, so one of them must fail.
-- =======================================================================
DEFINE EVENT touch_team_on_project ON TABLE project \
    WHEN $event = 'CREATE' THEN {
    UPDATE type::record('team', $after.team_id) SET updated_at = time::now();
};
DEFINE EVENT touch_project_on_section ON TABLE section \
    WHEN $event = 'CREATE' THEN {
    UPDATE type::record('project', $after.project_id) \
        SET updated_at = time::now();
};
DEFINE EVENT touch_section_on_resource ON TABLE resource \
    WHEN $event = 'CREATE' THEN {
    UPDATE type::record('section', $after.section_id) \
        SET updated_at = time::now();
};

-- =======================================================================
-- Last-admin guard
--
-- Skipped when the team itself is gone (team delete cascade). The team
-- touch serializes concurrent removals of different admins.
-- =======================================================================
DEFINE EVENT guard_last_admin ON TABLE participant \
    WHEN ($event = 'DELETE' AND $before.admin = true) \
    OR ($event = 'UPDATE' AND $before.admin = true AND $after.admin = false) \
    THEN {
    IF record::exists(type::record('team', $before.team_id)) {
        UPDATE type::record('team', $before.team_id) \
            SET updated_at = time::now();
        IF array::len(SELECT VALUE id FROM participant \
            WHERE team_id = $before.team_id AND admin = true) = 0 {
            THROW 'resman:last_admin';
        };
    };
};
";

// -----------------------------------------------------------------------
// Schema v2: store-wide key sequence, founding admin event
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
DEFINE SEQUENCE record_key BATCH 1000 START 1;

-- Set once at creation; the founding admin event reads it.
DEFINE FIELD created_by ON TABLE team TYPE option<int>;

DEFINE EVENT founding_admin ON TABLE team \
    WHEN $event = 'CREATE' AND $after.created_by != NONE THEN {
    CREATE type::record('participant', sequence::nextval('record_key')) SET \
        user_id = $after.created_by, \
        team_id = meta::id($after.id), \
        admin = true;
};
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

/// Returns the raw schema DDL for version 2.
pub fn schema_v2() -> &'static str {
    SCHEMA_V2
}
