use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Author, Comment, CommentView, Post, PostListing, User};
use crate::error::RepoError;
use crate::filter::{Page, PostFilter};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique-key clashes surface as `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity; `RepoError::NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Author repository.
#[async_trait]
pub trait AuthorRepository: BaseRepository<Author, Uuid> {
    /// The author bound to an account, if any.
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Author>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Active posts matching `filter`, ordered and paged as it requests.
    async fn list_active(&self, filter: &PostFilter) -> Result<Page<PostListing>, RepoError>;

    /// A single post with its author's name, regardless of `active`.
    async fn find_listing(&self, id: Uuid) -> Result<Option<PostListing>, RepoError>;

    /// Delete a post and all of its comments atomically.
    /// Returns the number of comments removed.
    async fn delete_with_comments(&self, id: Uuid) -> Result<u64, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError>;
}
