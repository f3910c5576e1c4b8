//! Integration tests for the SurrealDB repositories using in-memory
//! SurrealDB.

use resman_core::error::ResmanError;
use resman_core::models::participant::CreateParticipant;
use resman_core::models::project::{CreateProject, UpdateProject};
use resman_core::models::resource::{CreateResource, ResourceStatus, UpdateResource};
use resman_core::models::section::CreateSection;
use resman_core::models::team::{CreateTeam, UpdateTeam};
use resman_core::models::user::{CreateUser, User};
use resman_core::repository::{
    ListQuery, Pagination, ParticipantRepository, ProjectRepository, ResourceRepository,
    SectionRepository, Store, TeamRepository, UserRepository,
};
use resman_db::{StoreOptions, SurrealStore};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

/// Helper: spin up in-memory DB, run migrations, build the store.
async fn setup() -> SurrealStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    resman_db::run_migrations(&db).await.unwrap();
    SurrealStore::new(db, StoreOptions::default())
}

async fn user(store: &SurrealStore<Db>, name: &str) -> User {
    store
        .users()
        .create(CreateUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            password: None,
            oauth_subject: None,
        })
        .await
        .unwrap()
}

fn team(name: &str) -> CreateTeam {
    CreateTeam {
        name: name.into(),
        password: "team-secret".into(),
    }
}

// -----------------------------------------------------------------------
// Users
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_user_hashes_password_and_lowercases_email() {
    let store = setup().await;
    let created = store
        .users()
        .create(CreateUser {
            username: "ada".into(),
            email: "Ada@Example.com".into(),
            password: Some("correct horse".into()),
            oauth_subject: None,
        })
        .await
        .unwrap();

    assert_eq!(created.email, "ada@example.com");
    let hash = created.password_hash.expect("hash stored");
    assert!(hash.starts_with("$argon2id$"));

    let fetched = store.users().get_by_email("ADA@example.com").await.unwrap();
    assert_eq!(fetched.id, created.id);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let store = setup().await;
    user(&store, "ada").await;

    let err = store
        .users()
        .create(CreateUser {
            username: "other".into(),
            email: "ada@example.com".into(),
            password: None,
            oauth_subject: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ResmanError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn user_lookup_by_oauth_subject() {
    let store = setup().await;
    let created = store
        .users()
        .create(CreateUser {
            username: "grace".into(),
            email: "grace@example.com".into(),
            password: None,
            oauth_subject: Some("google-123".into()),
        })
        .await
        .unwrap();

    let found = store.users().get_by_oauth_subject("google-123").await.unwrap();
    assert_eq!(found.id, created.id);
    assert!(matches!(
        store.users().get_by_oauth_subject("nobody").await,
        Err(ResmanError::NotFound { .. })
    ));
}

// -----------------------------------------------------------------------
// Teams & participants
// -----------------------------------------------------------------------

#[tokio::test]
async fn team_creator_becomes_admin() {
    let store = setup().await;
    let ada = user(&store, "ada").await;

    let created = store.teams().create(team("Platform"), ada.id).await.unwrap();
    assert_eq!(created.name, "Platform");
    assert!(created.password_hash.starts_with("$argon2id$"));

    let membership = store.participants().get(created.id, ada.id).await.unwrap();
    assert!(membership.admin);

    let by_name = store.teams().get_by_name("Platform").await.unwrap();
    assert_eq!(by_name.id, created.id);
}

#[tokio::test]
async fn team_with_missing_creator_is_not_created() {
    let store = setup().await;

    let err = store.teams().create(team("Orphan"), 4242).await.unwrap_err();
    assert!(
        matches!(&err, ResmanError::NotFound { entity, .. } if entity == "user"),
        "got {err:?}"
    );
    assert!(store.teams().get_by_name("Orphan").await.is_err());
}

#[tokio::test]
async fn duplicate_team_name_is_a_conflict() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    store.teams().create(team("Platform"), ada.id).await.unwrap();

    let err = store.teams().create(team("Platform"), ada.id).await.unwrap_err();
    assert!(matches!(err, ResmanError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn concurrent_team_creates_with_one_name_yield_one_team() {
    let store = setup().await;
    let ada = user(&store, "ada").await;

    let (a, b) = tokio::join!(
        store.teams().create(team("Race"), ada.id),
        store.teams().create(team("Race"), ada.id),
    );
    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    let failure = a.err().or(b.err()).unwrap();
    match failure {
        ResmanError::Conflict { entity } => assert_eq!(entity, "team"),
        other => panic!("expected Conflict, got {other:?}"),
    }

    let page = store
        .teams()
        .list_for_user(ada.id, ListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn renaming_team_onto_existing_name_is_a_conflict() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    store.teams().create(team("Alpha"), ada.id).await.unwrap();
    let beta = store.teams().create(team("Beta"), ada.id).await.unwrap();

    let err = store
        .teams()
        .update(
            beta.id,
            UpdateTeam {
                name: Some("Alpha".into()),
                password: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ResmanError::Conflict { .. }));
}

#[tokio::test]
async fn duplicate_membership_is_a_conflict() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let bob = user(&store, "bob").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();

    let joined = store
        .participants()
        .create(CreateParticipant {
            user_id: bob.id,
            team_id: platform.id,
            admin: false,
        })
        .await
        .unwrap();
    assert!(!joined.admin);

    let err = store
        .participants()
        .create(CreateParticipant {
            user_id: bob.id,
            team_id: platform.id,
            admin: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ResmanError::Conflict { .. }));
}

#[tokio::test]
async fn concurrent_duplicate_memberships_name_the_participant() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let bob = user(&store, "bob").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();

    let membership = || CreateParticipant {
        user_id: bob.id,
        team_id: platform.id,
        admin: false,
    };
    let (a, b) = tokio::join!(
        store.participants().create(membership()),
        store.participants().create(membership()),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    match a.err().or(b.err()).unwrap() {
        ResmanError::Conflict { entity } => assert_eq!(entity, "participant"),
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn membership_in_missing_team_is_not_found() {
    let store = setup().await;
    let ada = user(&store, "ada").await;

    let err = store
        .participants()
        .create(CreateParticipant {
            user_id: ada.id,
            team_id: 999,
            admin: false,
        })
        .await
        .unwrap_err();
    assert!(
        matches!(&err, ResmanError::NotFound { entity, .. } if entity == "team"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn last_admin_cannot_be_removed_or_demoted() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();

    let err = store
        .participants()
        .delete(platform.id, ada.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ResmanError::RuleViolation { .. }), "got {err:?}");

    let err = store
        .participants()
        .set_admin(platform.id, ada.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ResmanError::RuleViolation { .. }));

    // Still an admin after both rejected attempts.
    assert!(store.participants().get(platform.id, ada.id).await.unwrap().admin);
}

#[tokio::test]
async fn admin_can_leave_once_another_admin_exists() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let bob = user(&store, "bob").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();
    store
        .participants()
        .create(CreateParticipant {
            user_id: bob.id,
            team_id: platform.id,
            admin: false,
        })
        .await
        .unwrap();

    let promoted = store
        .participants()
        .set_admin(platform.id, bob.id, true)
        .await
        .unwrap();
    assert!(promoted.admin);

    store.participants().delete(platform.id, ada.id).await.unwrap();
    assert!(matches!(
        store.participants().get(platform.id, ada.id).await,
        Err(ResmanError::NotFound { .. })
    ));
}

#[tokio::test]
async fn sole_admin_cannot_delete_their_account() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    store.teams().create(team("Platform"), ada.id).await.unwrap();

    let err = store.users().delete(ada.id).await.unwrap_err();
    assert!(matches!(err, ResmanError::RuleViolation { .. }), "got {err:?}");
    assert!(store.users().get_by_id(ada.id).await.is_ok());
}

#[tokio::test]
async fn deleting_a_member_removes_their_memberships() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let bob = user(&store, "bob").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();
    store
        .participants()
        .create(CreateParticipant {
            user_id: bob.id,
            team_id: platform.id,
            admin: false,
        })
        .await
        .unwrap();

    store.users().delete(bob.id).await.unwrap();
    let page = store
        .participants()
        .list_by_team(platform.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].user_id, ada.id);
}

#[tokio::test]
async fn teams_are_listed_per_member() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let bob = user(&store, "bob").await;
    store.teams().create(team("Platform"), ada.id).await.unwrap();
    store.teams().create(team("Payments"), ada.id).await.unwrap();
    store.teams().create(team("Bob's"), bob.id).await.unwrap();

    let mine = store
        .teams()
        .list_for_user(ada.id, ListQuery::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 2);

    let filtered = store
        .teams()
        .list_for_user(
            ada.id,
            ListQuery {
                pagination: Pagination::default(),
                filter: Some("pay".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);
    assert_eq!(filtered.items[0].name, "Payments");
}

// -----------------------------------------------------------------------
// Hierarchy
// -----------------------------------------------------------------------

#[tokio::test]
async fn child_of_missing_parent_is_not_found() {
    let store = setup().await;

    let err = store
        .projects()
        .create(CreateProject {
            team_id: 12345,
            name: "Orphan".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(&err, ResmanError::NotFound { entity, .. } if entity == "team"));

    let err = store
        .sections()
        .create(CreateSection {
            project_id: 12345,
            title: "Orphan".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(&err, ResmanError::NotFound { entity, .. } if entity == "project"));

    let err = store
        .resources()
        .create(CreateResource {
            section_id: 12345,
            title: "Orphan".into(),
            status: ResourceStatus::Todo,
            link: None,
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(&err, ResmanError::NotFound { entity, .. } if entity == "section"));
}

#[tokio::test]
async fn deleting_a_team_cascades_through_the_hierarchy() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();
    let project = store
        .projects()
        .create(CreateProject {
            team_id: platform.id,
            name: "Roadmap".into(),
        })
        .await
        .unwrap();
    let section = store
        .sections()
        .create(CreateSection {
            project_id: project.id,
            title: "Q1".into(),
        })
        .await
        .unwrap();
    let resource = store
        .resources()
        .create(CreateResource {
            section_id: section.id,
            title: "Roadmap".into(),
            status: ResourceStatus::InProgress,
            link: Some("https://example.com/roadmap".into()),
            notes: None,
        })
        .await
        .unwrap();

    store.teams().delete(platform.id).await.unwrap();

    assert!(matches!(
        store.teams().get_by_id(platform.id).await,
        Err(ResmanError::NotFound { .. })
    ));
    assert!(store.projects().get_by_id(project.id).await.is_err());
    assert!(store.sections().get_by_id(section.id).await.is_err());
    assert!(store.resources().get_by_id(resource.id).await.is_err());
    assert!(store.participants().get(platform.id, ada.id).await.is_err());

    // The creator survives and can delete their account now.
    store.users().delete(ada.id).await.unwrap();
}

#[tokio::test]
async fn deleting_a_project_leaves_siblings_alone() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();
    let doomed = store
        .projects()
        .create(CreateProject {
            team_id: platform.id,
            name: "Doomed".into(),
        })
        .await
        .unwrap();
    let kept = store
        .projects()
        .create(CreateProject {
            team_id: platform.id,
            name: "Kept".into(),
        })
        .await
        .unwrap();
    let kept_section = store
        .sections()
        .create(CreateSection {
            project_id: kept.id,
            title: "Stays".into(),
        })
        .await
        .unwrap();
    store
        .sections()
        .create(CreateSection {
            project_id: doomed.id,
            title: "Goes".into(),
        })
        .await
        .unwrap();

    store.projects().delete(doomed.id).await.unwrap();

    let remaining = store
        .projects()
        .list_by_team(platform.id, ListQuery::default())
        .await
        .unwrap();
    assert_eq!(remaining.total, 1);
    assert_eq!(remaining.items[0].id, kept.id);
    assert!(store.sections().get_by_id(kept_section.id).await.is_ok());

    assert!(matches!(
        store.projects().delete(doomed.id).await,
        Err(ResmanError::NotFound { .. })
    ));
}

#[tokio::test]
async fn project_rename_and_missing_update() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();
    let project = store
        .projects()
        .create(CreateProject {
            team_id: platform.id,
            name: "Before".into(),
        })
        .await
        .unwrap();

    let renamed = store
        .projects()
        .update(
            project.id,
            UpdateProject {
                name: Some("After".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "After");
    assert_eq!(renamed.team_id, platform.id);

    let err = store
        .projects()
        .update(project.id + 1, UpdateProject { name: Some("x".into()) })
        .await
        .unwrap_err();
    assert!(matches!(err, ResmanError::NotFound { .. }));
}

#[tokio::test]
async fn resource_patch_sets_and_clears_fields() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();
    let project = store
        .projects()
        .create(CreateProject {
            team_id: platform.id,
            name: "Roadmap".into(),
        })
        .await
        .unwrap();
    let section = store
        .sections()
        .create(CreateSection {
            project_id: project.id,
            title: "Q1".into(),
        })
        .await
        .unwrap();
    let resource = store
        .resources()
        .create(CreateResource {
            section_id: section.id,
            title: "Roadmap".into(),
            status: ResourceStatus::Todo,
            link: Some("https://example.com/roadmap".into()),
            notes: Some("draft".into()),
        })
        .await
        .unwrap();

    let patched = store
        .resources()
        .update(
            resource.id,
            UpdateResource {
                title: None,
                status: Some(ResourceStatus::Done),
                link: Some(String::new()),
                notes: Some("final".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(patched.title, "Roadmap");
    assert_eq!(patched.status, ResourceStatus::Done);
    assert_eq!(patched.link, None);
    assert_eq!(patched.notes.as_deref(), Some("final"));
}

#[tokio::test]
async fn pagination_is_stable_and_reports_total() {
    let store = setup().await;
    let ada = user(&store, "ada").await;
    let platform = store.teams().create(team("Platform"), ada.id).await.unwrap();
    let mut ids = Vec::new();
    for i in 0..7 {
        let project = store
            .projects()
            .create(CreateProject {
                team_id: platform.id,
                name: format!("Project {i}"),
            })
            .await
            .unwrap();
        ids.push(project.id);
    }

    let page = |offset, limit| ListQuery {
        pagination: Pagination {
            offset,
            limit: Some(limit),
        },
        filter: None,
    };

    let first = store.projects().list_by_team(platform.id, page(0, 3)).await.unwrap();
    let second = store.projects().list_by_team(platform.id, page(3, 3)).await.unwrap();
    let third = store.projects().list_by_team(platform.id, page(6, 3)).await.unwrap();

    assert_eq!(first.total, 7);
    assert_eq!(first.items.len(), 3);
    assert_eq!(third.items.len(), 1);

    let seen: Vec<i64> = first
        .items
        .iter()
        .chain(&second.items)
        .chain(&third.items)
        .map(|p| p.id)
        .collect();
    assert_eq!(seen, ids, "pages must cover every row once, in id order");

    let beyond = store.projects().list_by_team(platform.id, page(50, 3)).await.unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 7);
}
