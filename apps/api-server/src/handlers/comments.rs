//! Comment handlers.

use actix_web::{HttpResponse, web};

use quill_core::Caller;
use quill_core::domain::{CommentInput, CommentView};
use quill_shared::dto::{CommentResponse, CreateCommentRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Shown for comments whose account has been removed.
const ANONYMOUS: &str = "Anonymous";

/// POST /api/comments/
pub async fn create_comment(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let input = CommentInput {
        post: req.post,
        content: req.content,
    };

    let view = state
        .blog
        .create_comment(&Caller::from(identity), input)
        .await?;

    Ok(HttpResponse::Created().json(comment_response(view)))
}

pub(super) fn comment_response(view: CommentView) -> CommentResponse {
    let CommentView { comment, user_name } = view;
    CommentResponse {
        id: comment.id,
        post: comment.post_id,
        content: comment.content,
        user: comment.user_id,
        user_name: user_name.unwrap_or_else(|| ANONYMOUS.to_string()),
        created: comment.created,
        is_approved: comment.is_approved,
    }
}
