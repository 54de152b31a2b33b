//! In-memory store - used when no `DATABASE_URL` is configured, and by tests.
//!
//! Mirrors the PostgreSQL schema rules: unique keys, foreign keys and
//! cascading deletes. Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Author, Comment, CommentView, Post, PostListing, User};
use quill_core::error::RepoError;
use quill_core::filter::{Page, PostFilter};
use quill_core::ports::{
    AuthorRepository, BaseRepository, CommentRepository, PostRepository, UserRepository,
};


#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    authors: HashMap<Uuid, Author>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

/// A row type stored in [`Tables`].
trait Record: Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> Uuid;
    fn rows(tables: &Tables) -> &HashMap<Uuid, Self>;
    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self>;

    /// Unique and foreign keys that storing `self` would violate.
    fn check(&self, _tables: &Tables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Apply `ON DELETE` rules of rows referencing `id`.
    fn cascade(_tables: &mut Tables, _id: Uuid) {}
}

impl Record for User {
    const TABLE: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }
    fn rows(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.users
    }
    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.users
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        for other in tables.users.values().filter(|u| u.id != self.id) {
            if other.username == self.username {
                return Err(unique_violation("users_username_key"));
            }
            if other.email == self.email {
                return Err(unique_violation("users_email_key"));
            }
        }
        Ok(())
    }

    fn cascade(tables: &mut Tables, id: Uuid) {
        tables.comments.retain(|_, c| c.user_id != id);
        for author in tables.authors.values_mut() {
            if author.user_id == Some(id) {
                author.user_id = None;
            }
        }
    }
}

impl Record for Author {
    const TABLE: &'static str = "authors";

    fn id(&self) -> Uuid {
        self.id
    }
    fn rows(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.authors
    }
    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.authors
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if tables
            .authors
            .values()
            .any(|a| a.id != self.id && a.email == self.email)
        {
            return Err(unique_violation("authors_email_key"));
        }
        match self.user_id {
            Some(user_id) if !tables.users.contains_key(&user_id) => {
                Err(foreign_key_violation("authors_user_id_fkey"))
            }
            _ => Ok(()),
        }
    }

    fn cascade(tables: &mut Tables, id: Uuid) {
        let posts: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in posts {
            tables.posts.remove(&post_id);
            Post::cascade(tables, post_id);
        }
    }
}

impl Record for Post {
    const TABLE: &'static str = "posts";

    fn id(&self) -> Uuid {
        self.id
    }
    fn rows(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.posts
    }
    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.posts
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if tables.authors.contains_key(&self.author_id) {
            Ok(())
        } else {
            Err(foreign_key_violation("posts_author_id_fkey"))
        }
    }

    fn cascade(tables: &mut Tables, id: Uuid) {
        tables.comments.retain(|_, c| c.post_id != id);
    }
}

impl Record for Comment {
    const TABLE: &'static str = "comments";

    fn id(&self) -> Uuid {
        self.id
    }
    fn rows(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.comments
    }
    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.comments
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.posts.contains_key(&self.post_id) {
            return Err(foreign_key_violation("comments_post_id_fkey"));
        }
        if !tables.users.contains_key(&self.user_id) {
            return Err(foreign_key_violation("comments_user_id_fkey"));
        }
        Ok(())
    }
}

fn unique_violation(constraint: &str) -> RepoError {
    RepoError::Constraint(format!(
        "duplicate key value violates unique constraint \"{constraint}\""
    ))
}

fn foreign_key_violation(constraint: &str) -> RepoError {
    RepoError::Query(format!(
        "insert or update violates foreign key constraint \"{constraint}\""
    ))
}

/// All four tables behind one async `RwLock`.
///
/// Every write holds the lock for its whole duration, so multi-row
/// operations such as [`PostRepository::delete_with_comments`] are atomic.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    async fn find<R: Record>(&self, id: Uuid) -> Option<R> {
        let tables = self.tables.read().await;
        R::rows(&tables).get(&id).cloned()
    }

    async fn insert_row<R: Record>(&self, row: R) -> Result<R, RepoError> {
        let mut tables = self.tables.write().await;

        if R::rows(&tables).contains_key(&row.id()) {
            return Err(unique_violation(&format!("{}_pkey", R::TABLE)));
        }
        row.check(&tables)?;
        R::rows_mut(&mut tables).insert(row.id(), row.clone());

        tracing::debug!(table = R::TABLE, id = %row.id(), "Inserted row");
        Ok(row)
    }

    async fn update_row<R: Record>(&self, row: R) -> Result<R, RepoError> {
        let mut tables = self.tables.write().await;

        if !R::rows(&tables).contains_key(&row.id()) {
            return Err(RepoError::NotFound);
        }
        row.check(&tables)?;
        R::rows_mut(&mut tables).insert(row.id(), row.clone());

        tracing::debug!(table = R::TABLE, id = %row.id(), "Updated row");
        Ok(row)
    }

    async fn delete_row<R: Record>(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        if R::rows_mut(&mut tables).remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        R::cascade(&mut tables, id);

        tracing::debug!(table = R::TABLE, %id, "Deleted row");
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! base_repository {
    ($row:ty) => {
        #[async_trait]
        impl BaseRepository<$row, Uuid> for InMemoryStore {
            async fn find_by_id(&self, id: Uuid) -> Result<Option<$row>, RepoError> {
                Ok(self.find::<$row>(id).await)
            }

            async fn insert(&self, entity: $row) -> Result<$row, RepoError> {
                self.insert_row(entity).await
            }

            async fn update(&self, entity: $row) -> Result<$row, RepoError> {
                self.update_row(entity).await
            }

            async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
                self.delete_row::<$row>(id).await
            }
        }
    };
}

base_repository!(User);
base_repository!(Author);
base_repository!(Post);
base_repository!(Comment);

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl AuthorRepository for InMemoryStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Author>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .authors
            .values()
            .find(|a| a.user_id == Some(user_id))
            .cloned())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn list_active(&self, filter: &PostFilter) -> Result<Page<PostListing>, RepoError> {
        let tables = self.tables.read().await;

        let mut matched: Vec<(&Post, &str)> = tables
            .posts
            .values()
            .filter_map(|post| {
                let author = tables.authors.get(&post.author_id)?;
                filter
                    .matches(post, &author.name)
                    .then_some((post, author.name.as_str()))
            })
            .collect();
        matched.sort_by(|a, b| filter.compare(a.0, b.0));

        let count = matched.len() as u64;
        let skip = usize::try_from(filter.page.offset()).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(skip)
            .take(filter.page.page_size as usize)
            .map(|(post, author_name)| PostListing {
                post: post.clone(),
                author_name: author_name.to_string(),
            })
            .collect();

        Ok(Page::new(items, count, filter.page))
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<PostListing>, RepoError> {
        let tables = self.tables.read().await;

        let Some(post) = tables.posts.get(&id) else {
            return Ok(None);
        };
        let author = tables
            .authors
            .get(&post.author_id)
            .ok_or_else(|| RepoError::Query(format!("post {id} has no author")))?;

        Ok(Some(PostListing {
            post: post.clone(),
            author_name: author.name.clone(),
        }))
    }

    async fn delete_with_comments(&self, id: Uuid) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        let before = tables.comments.len();
        Post::cascade(&mut tables, id);

        Ok((before - tables.comments.len()) as u64)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let tables = self.tables.read().await;

        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                comment: comment.clone(),
                user_name: tables.users.get(&comment.user_id).map(|u| u.username.clone()),
            })
            .collect())
    }
}
