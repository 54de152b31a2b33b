use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CommentView;
use crate::validation::{self, AUTHOR_NAME_MAX_LEN, TITLE_MAX_LEN, ValidationErrors};

/// Editorial workflow state of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("\"{other}\" is not a valid choice.")),
        }
    }
}

/// Post entity - a blog entry owned by an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub published_date: DateTime<Utc>,
    pub status: PostStatus,
    /// Gates public listing and commentability.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post for `author_id`.
    pub fn new(author_id: Uuid, new: NewPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: new.title,
            content: new.content,
            published_date: new.published_date,
            status: new.status,
            active: new.active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated partial update. The owning author never changes here.
    pub fn apply(&mut self, changes: PostChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(content) = changes.content {
            self.content = content;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(active) = changes.active {
            self.active = active;
        }
        self.updated_at = Utc::now();
    }
}

/// Validated fields for a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub published_date: DateTime<Utc>,
    pub status: PostStatus,
    pub active: bool,
}

/// Raw post creation input as received from a client.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published_date: Option<String>,
    pub author_name: Option<String>,
    pub status: Option<String>,
    pub active: Option<bool>,
}

impl PostInput {
    /// Validate every field, returning the author name and the new post.
    pub fn validate(self) -> Result<(String, NewPost), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = validation::required_text(&mut errors, "title", self.title, Some(TITLE_MAX_LEN));
        let content = validation::required_text(&mut errors, "content", self.content, None);
        let author_name = validation::required_text(
            &mut errors,
            "author_name",
            self.author_name,
            Some(AUTHOR_NAME_MAX_LEN),
        );
        let published_date = match self.published_date.as_deref() {
            None => {
                errors.add("published_date", "This field is required.");
                None
            }
            Some(raw) => {
                let parsed = validation::parse_timestamp(raw);
                if parsed.is_none() {
                    errors.add("published_date", invalid_datetime());
                }
                parsed
            }
        };
        let status = parse_status(&mut errors, self.status.as_deref()).unwrap_or_default();

        match (title, content, author_name, published_date) {
            (Some(title), Some(content), Some(author_name), Some(published_date))
                if errors.is_empty() =>
            {
                Ok((
                    author_name,
                    NewPost {
                        title,
                        content,
                        published_date,
                        status,
                        active: self.active.unwrap_or(true),
                    },
                ))
            }
            _ => Err(errors),
        }
    }
}

/// Validated partial update of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub active: Option<bool>,
}

/// Raw partial update as received from a client.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub active: Option<bool>,
    /// Set when the client tried to reassign the owning author.
    pub author_change: bool,
}

impl PostPatch {
    pub fn validate(self) -> Result<PostChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.author_change {
            errors.add("author", "The owning author of a post cannot be changed.");
        }
        let title = self.title.and_then(|title| {
            validation::required_text(&mut errors, "title", Some(title), Some(TITLE_MAX_LEN))
        });
        let content = self
            .content
            .and_then(|content| validation::required_text(&mut errors, "content", Some(content), None));
        let status = parse_status(&mut errors, self.status.as_deref());

        errors.into_result(PostChanges {
            title,
            content,
            status,
            active: self.active,
        })
    }
}

/// A post together with the display name of its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostListing {
    pub post: Post,
    pub author_name: String,
}

/// A post with its comments, oldest first.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub listing: PostListing,
    pub comments: Vec<CommentView>,
}

fn parse_status(errors: &mut ValidationErrors, raw: Option<&str>) -> Option<PostStatus> {
    match raw.map(PostStatus::from_str) {
        Some(Ok(status)) => Some(status),
        Some(Err(message)) => {
            errors.add("status", message);
            None
        }
        None => None,
    }
}

fn invalid_datetime() -> &'static str {
    "Datetime has wrong format. Use one of these formats instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z], YYYY-MM-DD."
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> PostInput {
        PostInput {
            title: Some("Hello".into()),
            content: Some("World".into()),
            published_date: Some("2025-01-10T09:00:00Z".into()),
            author_name: Some("Ada".into()),
            status: None,
            active: None,
        }
    }

    #[test]
    fn test_post_input_defaults() {
        let (author_name, new) = input().validate().unwrap();

        assert_eq!(author_name, "Ada");
        assert_eq!(new.status, PostStatus::Draft);
        assert!(new.active);
    }

    #[test]
    fn test_post_input_missing_fields() {
        let errors = PostInput::default().validate().unwrap_err();

        for field in ["title", "content", "published_date", "author_name"] {
            assert!(errors.get(field).is_some(), "expected error on {field}");
        }
    }

    #[test]
    fn test_post_input_malformed_values() {
        let errors = PostInput {
            published_date: Some("yesterday".into()),
            status: Some("archived".into()),
            title: Some("x".repeat(TITLE_MAX_LEN + 1)),
            ..input()
        }
        .validate()
        .unwrap_err();

        assert!(errors.get("published_date").is_some());
        assert!(errors.get("status").is_some());
        assert!(errors.get("title").is_some());
        assert!(errors.get("content").is_none());
    }

    #[test]
    fn test_patch_rejects_author_change() {
        let errors = PostPatch {
            title: Some("New".into()),
            author_change: true,
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        assert!(errors.get("author").is_some());
        assert!(errors.get("title").is_none());
    }

    #[test]
    fn test_patch_apply_is_partial() {
        let (_, new) = input().validate().unwrap();
        let author_id = Uuid::new_v4();
        let mut post = Post::new(author_id, new);

        let changes = PostPatch {
            active: Some(false),
            status: Some("published".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        post.apply(changes);

        assert_eq!(post.title, "Hello");
        assert_eq!(post.status, PostStatus::Published);
        assert!(!post.active);
        assert_eq!(post.author_id, author_id);
    }

    #[test]
    fn test_patch_blank_title_rejected() {
        let errors = PostPatch {
            title: Some("  ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        assert!(errors.get("title").is_some());
    }
}
