//! Integration tests for the Membership repository, including the
//! single-owner rule, using in-memory SurrealDB.

use moodtrace_core::error::MoodTraceError;
use moodtrace_core::models::membership::{CreateMembership, MembershipRole};
use moodtrace_core::models::space::CreateSpace;
use moodtrace_core::repository::{MembershipRepository, Pagination, SpaceRepository};
use moodtrace_db::repository::{SurrealMembershipRepository, SurrealSpaceRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Spin up in-memory DB, run migrations, create a space with its owner.
async fn setup() -> (SurrealMembershipRepository<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    moodtrace_db::run_migrations(&db).await.unwrap();

    let space = SurrealSpaceRepository::new(db.clone())
        .create(CreateSpace {
            name: "Espace de Marie".into(),
            slug: "marie".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let repo = SurrealMembershipRepository::new(db);
    let owner = Uuid::new_v4();
    repo.create(CreateMembership {
        space_id: space.id,
        user_id: owner,
        roles: vec![MembershipRole::Owner],
    })
    .await
    .unwrap();

    (repo, space.id, owner)
}

async fn add_caregiver(
    repo: &SurrealMembershipRepository<Db>,
    space_id: Uuid,
    roles: Vec<MembershipRole>,
) -> Uuid {
    let user_id = Uuid::new_v4();
    repo.create(CreateMembership {
        space_id,
        user_id,
        roles,
    })
    .await
    .unwrap();
    user_id
}

#[tokio::test]
async fn owner_membership_is_readable() {
    let (repo, space_id, owner) = setup().await;

    let membership = repo.get(space_id, owner).await.unwrap();
    assert!(membership.is_owner());
    assert_eq!(membership.roles, vec![MembershipRole::Owner]);

    let fetched_owner = repo.get_owner(space_id).await.unwrap();
    assert_eq!(fetched_owner.user_id, owner);
}

#[tokio::test]
async fn second_owner_is_rejected() {
    let (repo, space_id, _) = setup().await;

    let result = repo
        .create(CreateMembership {
            space_id,
            user_id: Uuid::new_v4(),
            roles: vec![MembershipRole::Owner, MembershipRole::Admin],
        })
        .await;
    assert!(matches!(result, Err(MoodTraceError::AlreadyExists { .. })));
}

#[tokio::test]
async fn duplicate_membership_is_rejected() {
    let (repo, space_id, _) = setup().await;
    let user = add_caregiver(&repo, space_id, vec![MembershipRole::Member]).await;

    let result = repo
        .create(CreateMembership {
            space_id,
            user_id: user,
            roles: vec![MembershipRole::Admin],
        })
        .await;
    assert!(matches!(result, Err(MoodTraceError::AlreadyExists { .. })));
}

#[tokio::test]
async fn empty_roles_are_rejected() {
    let (repo, space_id, _) = setup().await;

    let result = repo
        .create(CreateMembership {
            space_id,
            user_id: Uuid::new_v4(),
            roles: vec![],
        })
        .await;
    assert!(matches!(result, Err(MoodTraceError::Validation { .. })));
}

#[tokio::test]
async fn missing_membership_is_not_found() {
    let (repo, space_id, _) = setup().await;
    let result = repo.get(space_id, Uuid::new_v4()).await;
    assert!(matches!(result, Err(MoodTraceError::NotFound { .. })));
}

#[tokio::test]
async fn caregiver_roles_can_change() {
    let (repo, space_id, _) = setup().await;
    let user = add_caregiver(&repo, space_id, vec![MembershipRole::Member]).await;

    let updated = repo
        .update_roles(
            space_id,
            user,
            vec![MembershipRole::Admin, MembershipRole::Member],
        )
        .await
        .unwrap();
    assert_eq!(
        updated.roles,
        vec![MembershipRole::Admin, MembershipRole::Member]
    );
}

#[tokio::test]
async fn owner_role_cannot_be_granted_or_removed() {
    let (repo, space_id, owner) = setup().await;
    let user = add_caregiver(&repo, space_id, vec![MembershipRole::Admin]).await;

    let grant = repo
        .update_roles(space_id, user, vec![MembershipRole::Owner])
        .await;
    assert!(matches!(grant, Err(MoodTraceError::Validation { .. })));

    let remove = repo
        .update_roles(space_id, owner, vec![MembershipRole::Admin])
        .await;
    assert!(matches!(remove, Err(MoodTraceError::Validation { .. })));
}

#[tokio::test]
async fn owner_cannot_be_removed_but_caregiver_can() {
    let (repo, space_id, owner) = setup().await;
    let user = add_caregiver(&repo, space_id, vec![MembershipRole::Member]).await;

    assert!(matches!(
        repo.delete(space_id, owner).await,
        Err(MoodTraceError::Validation { .. })
    ));

    repo.delete(space_id, user).await.unwrap();
    assert!(repo.get(space_id, user).await.is_err());
}

#[tokio::test]
async fn list_memberships_of_space_and_user() {
    let (repo, space_id, owner) = setup().await;
    let caregiver = add_caregiver(&repo, space_id, vec![MembershipRole::Member]).await;

    let page = repo
        .list_by_space(space_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);

    let owned = repo.list_by_user(owner).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert!(owned[0].is_owner());

    let caring = repo.list_by_user(caregiver).await.unwrap();
    assert_eq!(caring.len(), 1);
    assert!(!caring[0].is_owner());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_owner_creates_leave_one_owner() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    moodtrace_db::run_migrations(&db).await.unwrap();

    for round in 0..5 {
        let space = SurrealSpaceRepository::new(db.clone())
            .create(CreateSpace {
                name: format!("Espace {round}"),
                slug: format!("espace-{round}"),
                metadata: None,
            })
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = SurrealMembershipRepository::new(db.clone());
                let space_id = space.id;
                tokio::spawn(async move {
                    repo.create(CreateMembership {
                        space_id,
                        user_id: Uuid::new_v4(),
                        roles: vec![MembershipRole::Owner],
                    })
                    .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1, "round {round}");

        let members = SurrealMembershipRepository::new(db.clone())
            .list_by_space(space.id, Pagination::default())
            .await
            .unwrap();
        let owners = members.items.iter().filter(|m| m.is_owner()).count();
        assert_eq!(owners, 1, "round {round}");
    }
}
