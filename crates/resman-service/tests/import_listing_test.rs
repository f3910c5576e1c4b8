//! Integration tests for the bulk importer and the listing engine.

use std::sync::Arc;

use resman_core::error::ResmanError;
use resman_core::models::project::CreateProject;
use resman_core::models::resource::ResourceStatus;
use resman_core::models::section::{CreateSection, Section};
use resman_core::models::team::CreateTeam;
use resman_core::models::user::{CreateUser, User};
use resman_core::repository::{Store, UserRepository};
use resman_db::{StoreOptions, SurrealStore};
use resman_service::listing::DEFAULT_MAX_LIMIT;
use resman_service::{
    BulkImporter, HierarchyConfig, HierarchyService, ListParams, ListingEngine, RowFailure,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

struct Harness {
    store: Arc<SurrealStore<Db>>,
    hierarchy: HierarchyService<SurrealStore<Db>>,
    importer: BulkImporter<SurrealStore<Db>>,
    listing: ListingEngine<SurrealStore<Db>>,
}

async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    resman_db::run_migrations(&db).await.unwrap();

    let store = Arc::new(SurrealStore::new(db, StoreOptions::default()));
    Harness {
        hierarchy: HierarchyService::new(store.clone(), HierarchyConfig::default()),
        importer: BulkImporter::new(store.clone(), 4096),
        listing: ListingEngine::new(store.clone(), DEFAULT_MAX_LIMIT),
        store,
    }
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

/// A user owning one team with one project and one section.
async fn section(h: &Harness) -> (User, Section) {
    let ada = user(&h.store, "ada").await;
    let team = h
        .hierarchy
        .create_team(
            ada.id,
            CreateTeam {
                name: "Platform".into(),
                password: "team-secret".into(),
            },
        )
        .await
        .unwrap();
    let project = h
        .hierarchy
        .create_project(CreateProject {
            team_id: team.id,
            name: "Roadmap".into(),
        })
        .await
        .unwrap();
    let section = h
        .hierarchy
        .create_section(CreateSection {
            project_id: project.id,
            title: "Backlog".into(),
        })
        .await
        .unwrap();
    (ada, section)
}

fn all() -> ListParams {
    ListParams::default()
}

// -----------------------------------------------------------------------
// Bulk import
// -----------------------------------------------------------------------

#[tokio::test]
async fn import_isolates_row_failures() {
    let h = setup().await;
    let (_, s) = section(&h).await;

    let csv = "\
title,status,link
Write intro,todo,https://example.com/intro
Draft API,in_progress,
,done,
Review,Done,
Publish,,https://example.com/pub
";
    let report = h.importer.import(s.id, csv.as_bytes()).await.unwrap();
    assert_eq!(report.imported, 4);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].row, 3);
    assert_eq!(report.failed[0].line, Some(4));
    assert!(report.failed[0].reason.contains("title"));

    let page = h.listing.list_resources(s.id, &all()).await.unwrap();
    assert_eq!(page.total, 4);
    let titles: Vec<_> = page.items.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Write intro", "Draft API", "Review", "Publish"]);
    assert_eq!(page.items[2].status, ResourceStatus::Done);
    assert_eq!(page.items[3].status, ResourceStatus::Todo);
}

#[tokio::test]
async fn blank_lines_shift_rows_but_not_lines() {
    let h = setup().await;
    let (_, s) = section(&h).await;

    let report = h
        .importer
        .import(s.id, b"title,status\nA,todo\n\n,todo\n")
        .await
        .unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].row, 2);
    assert_eq!(report.failed[0].line, Some(4));
}

#[tokio::test]
async fn import_reports_bad_status_and_link() {
    let h = setup().await;
    let (_, s) = section(&h).await;

    let csv = "Link,Title,Status,owner\nnot-a-url,One,todo,ada\n,Two,blocked,bob\n";
    let report = h.importer.import(s.id, csv.as_bytes()).await.unwrap();
    assert_eq!(report.imported, 0);
    let rows: Vec<_> = report.failed.iter().map(|f| f.row).collect();
    assert_eq!(rows, [1, 2]);
    assert!(report.failed[0].reason.contains("link"));
    assert!(report.failed[1].reason.contains("blocked"));
}

#[tokio::test]
async fn import_without_title_header_is_rejected() {
    let h = setup().await;
    let (_, s) = section(&h).await;

    let err = h
        .importer
        .import(s.id, b"name,status\nOne,todo\n")
        .await
        .unwrap_err();
    assert!(matches!(err, ResmanError::Validation(_)));
}

#[tokio::test]
async fn import_into_missing_section_is_not_found() {
    let h = setup().await;
    let err = h.importer.import(777, b"title\nOne\n").await.unwrap_err();
    assert!(matches!(err, ResmanError::NotFound { .. }));
}

#[tokio::test]
async fn oversized_payload_is_rejected() {
    let h = setup().await;
    let (_, s) = section(&h).await;

    let payload = format!("title\n{}\n", "x".repeat(5000));
    let err = h.importer.import(s.id, payload.as_bytes()).await.unwrap_err();
    assert!(matches!(err, ResmanError::Validation(_)));
}

#[tokio::test]
async fn row_failure_serializes_with_row_and_reason() {
    let json = serde_json::to_value(RowFailure {
        row: 3,
        line: Some(5),
        reason: "title: is required".into(),
    })
    .unwrap();
    assert_eq!(json["row"], 3);
    assert_eq!(json["line"], 5);
    assert_eq!(json["reason"], "title: is required");

    let without_line = serde_json::to_value(RowFailure {
        row: 1,
        line: None,
        reason: "malformed record".into(),
    })
    .unwrap();
    assert!(without_line.get("line").is_none());
}

// -----------------------------------------------------------------------
// Listing
// -----------------------------------------------------------------------

#[tokio::test]
async fn pages_are_stable_and_ordered_by_id() {
    let h = setup().await;
    let (_, s) = section(&h).await;
    let project_id = s.project_id;
    for title in ["alpha", "beta", "gamma", "delta", "epsilon"] {
        h.hierarchy
            .create_section(CreateSection {
                project_id,
                title: title.into(),
            })
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    for offset in [0, 2, 4] {
        let page = h
            .listing
            .list_sections(
                project_id,
                &ListParams {
                    offset: Some(offset),
                    limit: Some(2),
                    filter: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 6);
        seen.extend(page.items.into_iter().map(|s| s.id));
    }
    assert_eq!(seen.len(), 6);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn filter_matches_case_insensitively_and_counts_before_paging() {
    let h = setup().await;
    let (_, s) = section(&h).await;
    let project_id = s.project_id;
    for title in ["Design Review", "design sync", "Retro"] {
        h.hierarchy
            .create_section(CreateSection {
                project_id,
                title: title.into(),
            })
            .await
            .unwrap();
    }

    let page = h
        .listing
        .list_sections(
            project_id,
            &ListParams {
                offset: None,
                limit: Some(1),
                filter: Some("  DESIGN ".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Design Review");

    let empty = h
        .listing
        .list_sections(
            project_id,
            &ListParams {
                filter: Some("nothing".into()),
                ..all()
            },
        )
        .await
        .unwrap();
    assert_eq!(empty.total, 0);
    assert!(empty.items.is_empty());
}

#[tokio::test]
async fn teams_and_participants_are_listed_per_scope() {
    let h = setup().await;
    let (ada, s) = section(&h).await;
    let bob = user(&h.store, "bob").await;
    let team_id = h.hierarchy.team_of_section(s.id).await.unwrap();

    assert_eq!(h.listing.list_teams(bob.id, &all()).await.unwrap().total, 0);
    h.hierarchy
        .join_team_as(bob.id, "Platform", "team-secret")
        .await
        .unwrap();

    let teams = h.listing.list_teams(bob.id, &all()).await.unwrap();
    assert_eq!(teams.total, 1);
    assert_eq!(teams.items[0].id, team_id);

    let members = h.listing.list_participants(team_id, &all()).await.unwrap();
    let users: Vec<_> = members.items.iter().map(|p| p.user_id).collect();
    assert_eq!(users, [ada.id, bob.id]);

    let projects = h.listing.list_projects(team_id, &all()).await.unwrap();
    assert_eq!(projects.total, 1);
}
