//! Execution helpers shared by the repositories.

use std::future::IntoFuture;
use std::time::Duration;

use resman_core::repository::ListQuery;

use crate::error::DbError;

/// Await a store call, failing with [`DbError::Timeout`] past `limit`.
pub(crate) async fn bounded<F, T>(limit: Duration, call: F) -> Result<T, DbError>
where
    F: IntoFuture<Output = Result<T, surrealdb::Error>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(DbError::from),
        Err(_) => Err(DbError::Timeout),
    }
}

/// Count and page statements for a scoped listing.
///
/// Statement 0 yields a `CountRow`, statement 1 the page rows with a
/// `record_id` column. Expects `$scope`, `$filter`, `$limit` and
/// `$offset` to be bound.
pub(crate) fn list_statements(
    table: &str,
    scope: &str,
    filter_field: Option<&str>,
    query: &ListQuery,
) -> String {
    let mut condition = scope.to_string();
    if let (Some(field), Some(_)) = (filter_field, &query.filter) {
        condition.push_str(&format!(
            " AND string::contains(string::lowercase({field}), $filter)"
        ));
    }
    let page = if query.pagination.limit.is_some() {
        "LIMIT $limit START $offset"
    } else {
        "START $offset"
    };
    format!(
        "SELECT count() AS total FROM {table} WHERE {condition} GROUP ALL; \
         SELECT meta::id(id) AS record_id, * FROM {table} WHERE {condition} \
         ORDER BY id ASC {page};"
    )
}
