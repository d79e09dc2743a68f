//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let applied = moodtrace_db::run_migrations(&db).await.unwrap();
    assert_eq!(applied, 1);

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("space"), "missing space table");
    assert!(info_str.contains("membership"), "missing membership table");
    assert!(
        info_str.contains("subscription"),
        "missing subscription table"
    );
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    assert_eq!(moodtrace_db::run_migrations(&db).await.unwrap(), 1);
    assert_eq!(moodtrace_db::run_migrations(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn membership_roles_are_asserted() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    moodtrace_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE membership SET space_id = 's', user_id = 'u', \
             owner_slot = 's', roles = ['superuser']",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err(), "unknown role tag should be rejected");
}

#[tokio::test]
async fn second_owner_slot_is_rejected() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    moodtrace_db::run_migrations(&db).await.unwrap();

    db.query(
        "CREATE membership SET space_id = 's', user_id = 'u1', \
         owner_slot = 's', roles = ['owner']",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    let result = db
        .query(
            "CREATE membership SET space_id = 's', user_id = 'u2', \
             owner_slot = 's', roles = ['owner']",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err(), "a space holds a single owner row");
}
