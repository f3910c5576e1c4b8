//! Record key allocation.
//!
//! Keys are drawn from the `record_key` sequence defined in the schema,
//! so every server sharing one store draws from the same key space. A
//! node reserves keys in batches: keys ascend per node and interleave
//! across nodes.

use std::time::Duration;

use surrealdb::{Connection, Surreal};

use crate::error::DbError;
use crate::query::bounded;

/// Allocate a fresh positive record key.
pub(crate) async fn next_id<C: Connection>(
    db: &Surreal<C>,
    timeout: Duration,
) -> Result<i64, DbError> {
    let mut result = bounded(timeout, db.query("RETURN sequence::nextval('record_key')"))
        .await?
        .check()
        .map_err(DbError::from_query)?;

    let key: Option<i64> = result.take(0)?;
    key.ok_or_else(|| DbError::Query("record_key sequence returned no value".into()))
}
