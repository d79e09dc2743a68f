//! Integration tests for the Space repository using in-memory SurrealDB.

use moodtrace_core::error::MoodTraceError;
use moodtrace_core::models::membership::{CreateMembership, MembershipRole};
use moodtrace_core::models::space::{CreateSpace, UpdateSpace};
use moodtrace_core::repository::{MembershipRepository, Pagination, SpaceRepository};
use moodtrace_db::repository::{SurrealMembershipRepository, SurrealSpaceRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    moodtrace_db::run_migrations(&db).await.unwrap();
    db
}

fn new_space(slug: &str) -> CreateSpace {
    CreateSpace {
        name: format!("Espace {slug}"),
        slug: slug.into(),
        metadata: None,
    }
}

#[tokio::test]
async fn create_and_get_space() {
    let db = setup().await;
    let repo = SurrealSpaceRepository::new(db);

    let space = repo.create(new_space("marie-d")).await.unwrap();
    assert_eq!(space.slug, "marie-d");
    assert_eq!(space.metadata, serde_json::json!({}));

    let fetched = repo.get_by_id(space.id).await.unwrap();
    assert_eq!(fetched.id, space.id);
    assert_eq!(fetched.name, "Espace marie-d");
}

#[tokio::test]
async fn get_space_by_slug() {
    let db = setup().await;
    let repo = SurrealSpaceRepository::new(db);

    let space = repo.create(new_space("paul")).await.unwrap();
    let fetched = repo.get_by_slug("paul").await.unwrap();
    assert_eq!(fetched.id, space.id);

    let missing = repo.get_by_slug("nobody").await;
    assert!(matches!(missing, Err(MoodTraceError::NotFound { .. })));
}

#[tokio::test]
async fn update_space() {
    let db = setup().await;
    let repo = SurrealSpaceRepository::new(db);

    let space = repo.create(new_space("before")).await.unwrap();
    let updated = repo
        .update(
            space.id,
            UpdateSpace {
                slug: Some("after".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.slug, "after");
    assert_eq!(updated.name, "Espace before");
    assert!(repo.get_by_slug("before").await.is_err());
}

#[tokio::test]
async fn duplicate_slug_rejected() {
    let db = setup().await;
    let repo = SurrealSpaceRepository::new(db);

    repo.create(new_space("taken")).await.unwrap();
    let result = repo.create(new_space("taken")).await;
    assert!(result.is_err(), "duplicate slug should be rejected");
}

#[tokio::test]
async fn delete_space_removes_memberships() {
    let db = setup().await;
    let spaces = SurrealSpaceRepository::new(db.clone());
    let members = SurrealMembershipRepository::new(db);

    let space = spaces.create(new_space("gone")).await.unwrap();
    let owner = Uuid::new_v4();
    members
        .create(CreateMembership {
            space_id: space.id,
            user_id: owner,
            roles: vec![MembershipRole::Owner],
        })
        .await
        .unwrap();

    spaces.delete(space.id).await.unwrap();

    assert!(spaces.get_by_id(space.id).await.is_err());
    assert!(members.list_by_user(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_spaces_paginates() {
    let db = setup().await;
    let repo = SurrealSpaceRepository::new(db);

    for slug in ["a", "b", "c"] {
        repo.create(new_space(slug)).await.unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let rest = repo
        .list(Pagination {
            offset: 2,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
}
