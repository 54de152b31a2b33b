//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::Caller;
use quill_core::domain::{PostInput, PostListing, PostPatch};
use quill_core::filter::{PostFilter, PostListParams};
use quill_shared::PaginatedResponse;
use quill_shared::dto::{
    CreatePostRequest, PostDetailResponse, PostListItem, PostListQuery, PostResponse,
    UpdatePostRequest,
};

use super::comments::comment_response;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts/
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let filter = PostFilter::parse(list_params(query.into_inner()))?;
    let page = state.blog.list_posts(&filter).await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        count: page.count,
        page: page.page,
        page_size: page.page_size,
        results: page.items.into_iter().map(list_item).collect::<Vec<_>>(),
    }))
}

/// POST /api/posts/
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let input = PostInput {
        title: req.title,
        content: req.content,
        published_date: req.published_date,
        author_name: req.author_name,
        status: req.status,
        active: req.active,
    };

    let listing = state
        .blog
        .create_post(&Caller::from(identity), input)
        .await?;

    Ok(HttpResponse::Created().json(post_response(listing)))
}

/// GET /api/posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state.blog.post_detail(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: post_response(detail.listing),
        comments: detail.comments.into_iter().map(comment_response).collect(),
    }))
}

/// PATCH /api/posts/{id}/edit/
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let patch = PostPatch {
        author_change: req.touches_author(),
        title: req.title,
        content: req.content,
        status: req.status,
        active: req.active,
    };

    let listing = state
        .blog
        .update_post(&Caller::from(identity), path.into_inner(), patch)
        .await?;

    Ok(HttpResponse::Ok().json(post_response(listing)))
}

/// DELETE /api/posts/{id}/delete/
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .blog
        .delete_post(&Caller::from(identity), path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

fn list_params(query: PostListQuery) -> PostListParams {
    PostListParams {
        author_name: query.author_name,
        title: query.title,
        search: query.search,
        published_from: query.published_from,
        published_to: query.published_to,
        ordering: query.ordering,
        page: query.page,
        page_size: query.page_size,
    }
}

fn list_item(listing: PostListing) -> PostListItem {
    let PostListing { post, author_name } = listing;
    PostListItem {
        id: post.id,
        title: post.title,
        content: post.content,
        published_date: post.published_date,
        author_name,
    }
}

fn post_response(listing: PostListing) -> PostResponse {
    let PostListing { post, author_name } = listing;
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        published_date: post.published_date,
        author_name,
        status: post.status.to_string(),
        active: post.active,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}
