//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// An account's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub author: Option<AuthorResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Body of `POST /api/posts/`.
///
/// Every field is optional on the wire so that missing ones are reported
/// together as field errors instead of a single parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published_date: Option<String>,
    pub author_name: Option<String>,
    pub status: Option<String>,
    pub active: Option<bool>,
}

/// Body of `PATCH /api/posts/{id}/edit/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub active: Option<bool>,
    /// Ownership fields are accepted only to be rejected. A present key is
    /// `Some`, even when its value is `null`.
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub author: Option<serde_json::Value>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<serde_json::Value>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub author_name: Option<serde_json::Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl UpdatePostRequest {
    /// Whether the body tries to change the owning author.
    pub fn touches_author(&self) -> bool {
        self.author.is_some() || self.author_id.is_some() || self.author_name.is_some()
    }
}

/// Body of `POST /api/comments/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCommentRequest {
    pub post: Option<String>,
    pub content: Option<String>,
}

/// Query string of `GET /api/posts/`. Values stay raw; parsing and range
/// checks happen in the domain filter so errors name the parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostListQuery {
    #[serde(rename = "author__name", alias = "author")]
    pub author_name: Option<String>,
    pub title: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "published_date__gte", alias = "from")]
    pub published_from: Option<String>,
    #[serde(rename = "published_date__lte", alias = "to")]
    pub published_to: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// A post as it appears in the listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published_date: DateTime<Utc>,
    pub author_name: String,
}

/// A single post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published_date: DateTime<Utc>,
    pub author_name: String,
    pub status: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single post with its comments, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post: Uuid,
    pub content: String,
    pub user: Uuid,
    pub user_name: String,
    pub created: DateTime<Utc>,
    pub is_approved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_accepts_lookup_names_and_aliases() {
        let lookups: PostListQuery = serde_json::from_value(serde_json::json!({
            "author__name": "ada",
            "published_date__gte": "2025-01-01",
        }))
        .unwrap();
        let aliases: PostListQuery = serde_json::from_value(serde_json::json!({
            "author": "ada",
            "to": "2025-02-01",
        }))
        .unwrap();

        assert_eq!(lookups.author_name.as_deref(), Some("ada"));
        assert_eq!(lookups.published_from.as_deref(), Some("2025-01-01"));
        assert_eq!(aliases.author_name.as_deref(), Some("ada"));
        assert_eq!(aliases.published_to.as_deref(), Some("2025-02-01"));
    }

    #[test]
    fn test_update_request_detects_author_change() {
        let body: UpdatePostRequest =
            serde_json::from_value(serde_json::json!({ "author_id": 7 })).unwrap();
        assert!(body.touches_author());

        let body: UpdatePostRequest =
            serde_json::from_value(serde_json::json!({ "author": null, "title": "x" })).unwrap();
        assert!(body.touches_author());

        let body: UpdatePostRequest =
            serde_json::from_value(serde_json::json!({ "title": "New" })).unwrap();
        assert!(!body.touches_author());
    }
}
