//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    resman_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in ["user", "team", "participant", "project", "section", "resource"] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    resman_db::run_migrations(&db).await.unwrap();
    resman_db::run_migrations(&db).await.unwrap();

    let mut result = db
        .query("SELECT count() AS total FROM _migration GROUP ALL")
        .await
        .unwrap();
    let total: Option<u64> = result.take("total").unwrap();
    assert_eq!(total, Some(2));
}

#[tokio::test]
async fn record_keys_come_from_a_shared_sequence() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    resman_db::run_migrations(&db).await.unwrap();

    let mut result = db
        .query(
            "RETURN sequence::nextval('record_key'); \
             RETURN sequence::nextval('record_key');",
        )
        .await
        .unwrap();
    let first: Option<i64> = result.take(0).unwrap();
    let second: Option<i64> = result.take(1).unwrap();
    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(first > 0);
    assert!(second > first);
}
