use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{self, ValidationErrors};

/// Comment entity - a reply attached to a post. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created: DateTime<Utc>,
    /// Moderation flag; new comments start unapproved.
    pub is_approved: bool,
}

impl Comment {
    pub fn new(post_id: Uuid, user_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            content,
            created: Utc::now(),
            is_approved: false,
        }
    }
}

/// Raw comment input as received from a client.
#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub post: Option<String>,
    pub content: Option<String>,
}

/// Comment input after field validation. The target post is not yet checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: Uuid,
    pub content: String,
}

impl CommentInput {
    pub fn validate(self) -> Result<NewComment, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let post_id = match self.post.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("post", "This field is required.");
                None
            }
            Some(raw) => {
                let parsed = Uuid::parse_str(raw).ok();
                if parsed.is_none() {
                    errors.add("post", invalid_post(raw));
                }
                parsed
            }
        };
        let content = validation::required_text(&mut errors, "content", self.content, None);

        match (post_id, content) {
            (Some(post_id), Some(content)) => Ok(NewComment { post_id, content }),
            _ => Err(errors),
        }
    }
}

/// Error message for a `post` reference that does not resolve.
pub(crate) fn invalid_post(raw: &str) -> String {
    format!("Invalid pk \"{raw}\" - object does not exist.")
}

/// A comment with the username of the account that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: Comment,
    pub user_name: Option<String>,
}
