//! Blog use cases.
//!
//! Every operation receives its store handles through [`BlogService`] and,
//! for writes, an explicit [`Caller`]. Ownership is checked by
//! [`ensure_owner`] before any mutation.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    Author, Comment, CommentInput, CommentView, Post, PostDetail, PostInput, PostListing,
    PostPatch, invalid_post,
};
use crate::error::DomainError;
use crate::filter::{Page, PostFilter};
use crate::ports::{AuthorRepository, CommentRepository, PostRepository};
use crate::validation::ValidationErrors;

/// The authenticated account on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

/// Allow a mutation only when `author` is the post's owner.
///
/// A caller with no author profile never owns anything.
pub fn ensure_owner(author: Option<&Author>, post: &Post) -> Result<(), DomainError> {
    match author {
        Some(author) if author.id == post.author_id => Ok(()),
        _ => Err(DomainError::Forbidden),
    }
}

/// Use cases over authors, posts and comments.
#[derive(Clone)]
pub struct BlogService {
    authors: Arc<dyn AuthorRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl BlogService {
    pub fn new(
        authors: Arc<dyn AuthorRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            authors,
            posts,
            comments,
        }
    }

    /// Public listing: active posts only.
    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Page<PostListing>, DomainError> {
        let page = self.posts.list_active(filter).await?;
        tracing::debug!(
            count = page.count,
            page = page.page,
            returned = page.items.len(),
            "Listed posts"
        );
        Ok(page)
    }

    /// A post with its comments. Inactive posts are still returned.
    pub async fn post_detail(&self, id: Uuid) -> Result<PostDetail, DomainError> {
        let listing = self
            .posts
            .find_listing(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "Post",
                id,
            })?;
        let comments = self.comments.list_for_post(id).await?;

        Ok(PostDetail { listing, comments })
    }

    /// The caller's author profile, if one exists.
    pub async fn author_for(&self, caller: &Caller) -> Result<Option<Author>, DomainError> {
        Ok(self.authors.find_by_user_id(caller.user_id).await?)
    }

    /// Create a post owned by the caller's author, creating or renaming that
    /// author to match `author_name`.
    pub async fn create_post(
        &self,
        caller: &Caller,
        input: PostInput,
    ) -> Result<PostListing, DomainError> {
        let (author_name, new_post) = input.validate()?;
        let author = self.resolve_author(caller, author_name).await?;

        let post = self.posts.insert(Post::new(author.id, new_post)).await?;
        tracing::info!(post_id = %post.id, author_id = %author.id, "Post created");

        Ok(PostListing {
            post,
            author_name: author.name,
        })
    }

    /// Partially update a post. Owner only.
    pub async fn update_post(
        &self,
        caller: &Caller,
        id: Uuid,
        patch: PostPatch,
    ) -> Result<PostListing, DomainError> {
        let PostListing {
            mut post,
            author_name,
        } = self.owned_post(caller, id).await?;

        let changes = patch.validate()?;
        post.apply(changes);
        let post = self.posts.update(post).await?;
        tracing::info!(post_id = %post.id, "Post updated");

        Ok(PostListing { post, author_name })
    }

    /// Delete a post and its comments. Owner only.
    pub async fn delete_post(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        self.owned_post(caller, id).await?;

        let removed = self.posts.delete_with_comments(id).await?;
        tracing::info!(post_id = %id, comments_removed = removed, "Post deleted");
        Ok(())
    }

    /// Comment on an active post.
    pub async fn create_comment(
        &self,
        caller: &Caller,
        input: CommentInput,
    ) -> Result<CommentView, DomainError> {
        let new = input.validate()?;

        let post = self.posts.find_by_id(new.post_id).await?.ok_or_else(|| {
            ValidationErrors::single("post", invalid_post(&new.post_id.to_string()))
        })?;
        if !post.active {
            tracing::debug!(post_id = %post.id, "Rejected comment on inactive post");
            return Err(DomainError::InactivePost(post.id));
        }

        let comment = self
            .comments
            .insert(Comment::new(post.id, caller.user_id, new.content))
            .await?;
        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment created");

        Ok(CommentView {
            comment,
            user_name: Some(caller.username.clone()),
        })
    }

    async fn owned_post(&self, caller: &Caller, id: Uuid) -> Result<PostListing, DomainError> {
        let listing = self
            .posts
            .find_listing(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "Post",
                id,
            })?;
        let author = self.authors.find_by_user_id(caller.user_id).await?;

        if let Err(err) = ensure_owner(author.as_ref(), &listing.post) {
            tracing::warn!(
                post_id = %id,
                user_id = %caller.user_id,
                "Rejected modification by non-owner"
            );
            return Err(err);
        }
        Ok(listing)
    }

    async fn resolve_author(&self, caller: &Caller, name: String) -> Result<Author, DomainError> {
        match self.authors.find_by_user_id(caller.user_id).await? {
            Some(author) if author.name == name => Ok(author),
            Some(mut author) => {
                author.rename(name);
                Ok(self.authors.update(author).await?)
            }
            None => {
                let author = self
                    .authors
                    .insert(Author::new(name, caller.email.clone(), Some(caller.user_id)))
                    .await?;
                tracing::info!(author_id = %author.id, user_id = %caller.user_id, "Author profile created");
                Ok(author)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::PostStatus;

    fn post_by(author_id: Uuid) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            author_id,
            title: "t".into(),
            content: "c".into(),
            published_date: now,
            status: PostStatus::Draft,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        let author = Author::new("A".into(), "a@example.com".into(), Some(Uuid::new_v4()));
        assert!(ensure_owner(Some(&author), &post_by(author.id)).is_ok());
    }

    #[test]
    fn test_other_author_is_forbidden() {
        let author = Author::new("B".into(), "b@example.com".into(), None);
        let result = ensure_owner(Some(&author), &post_by(Uuid::new_v4()));
        assert!(matches!(result, Err(DomainError::Forbidden)));
    }

    #[test]
    fn test_missing_author_is_forbidden() {
        let result = ensure_owner(None, &post_by(Uuid::new_v4()));
        assert!(matches!(result, Err(DomainError::Forbidden)));
    }
}
