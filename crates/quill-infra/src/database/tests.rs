use chrono::{TimeZone, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use quill_core::domain::{Post, PostStatus, User};
use quill_core::error::RepoError;
use quill_core::filter::{PostFilter, PostListParams};
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

use crate::database::entity::{post, user};
use crate::database::{PostgresPostRepository, PostgresUserRepository};

fn post_model(id: Uuid, author_id: Uuid, active: bool) -> post::Model {
    let published = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
    post::Model {
        id,
        author_id,
        title: "Test Post".to_owned(),
        content: "Content".to_owned(),
        published_date: published.into(),
        status: post::Status::Published,
        active,
        created_at: published.into(),
        updated_at: published.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, author_id, false)]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let post: Post = repo.find_by_id(post_id).await.unwrap().unwrap();

    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
    assert_eq!(post.status, PostStatus::Published);
    assert!(!post.active);
}

#[tokio::test]
async fn test_update_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let post: Post = post_model(Uuid::new_v4(), Uuid::new_v4(), true).into();
    let result = repo.update(post).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_find_user_by_username() {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user::Model {
            id,
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();
    let repo = PostgresUserRepository::new(db);

    let user: User = repo.find_by_username("ada").await.unwrap().unwrap();

    assert_eq!(user.id, id);
    assert_eq!(user.email, "ada@example.com");
}

#[tokio::test]
async fn test_delete_with_comments_reports_removed_comments() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
        ])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let removed = repo.delete_with_comments(Uuid::new_v4()).await.unwrap();

    assert_eq!(removed, 3);
}

#[tokio::test]
async fn test_delete_with_comments_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let result = repo.delete_with_comments(Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_list_active_builds_filtered_query() {
    let count_row = BTreeMap::from([("num_items", Value::BigInt(Some(0)))]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row]])
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let filter = PostFilter::parse(PostListParams {
        author_name: Some("Ada".into()),
        published_from: Some("2025-01-11".into()),
        page: Some("2".into()),
        ..Default::default()
    })
    .unwrap();
    let page = repo.list_active(&filter).await.unwrap();

    assert_eq!(page.count, 0);
    assert_eq!(page.page, 2);
    assert!(page.items.is_empty());

    // Debug output escapes the quoted identifiers
    let log = format!("{:?}", repo.db.into_transaction_log());
    assert!(log.contains("LOWER"));
    assert!(log.contains("%ada%"));
    assert!(log.contains(r#"\"active\""#));
    assert!(log.contains(r#"\"published_date\" >="#));
}

#[tokio::test]
async fn test_title_ordering_ignores_case() {
    let count_row = BTreeMap::from([("num_items", Value::BigInt(Some(0)))]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row]])
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let filter = PostFilter::parse(PostListParams {
        ordering: Some("-title".into()),
        ..Default::default()
    })
    .unwrap();
    repo.list_active(&filter).await.unwrap();

    let log = format!("{:?}", repo.db.into_transaction_log());
    assert!(log.contains(r#"LOWER(\"posts\".\"title\") COLLATE \"C\" DESC"#));
}
