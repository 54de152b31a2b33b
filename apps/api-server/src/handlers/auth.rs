//! Authentication handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use quill_core::Caller;
use quill_core::domain::{Registration, User};
use quill_core::ports::{PasswordService, TokenService};
use quill_shared::dto::{
    AuthResponse, AuthorResponse, LoginRequest, RegisterUserRequest, UserResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let registration = Registration {
        username: req.username,
        email: req.email,
        password: req.password,
    }
    .validate()?;

    if state
        .users
        .find_by_username(&registration.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }
    if state
        .users
        .find_by_email(&registration.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A user with that email already exists.".to_string(),
        ));
    }

    let password_hash = password_service
        .hash(&registration.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User::new(registration.username, registration.email, password_hash);
    let user = state.users.insert(user).await?;
    tracing::info!(user_id = %user.id, "Account registered");

    Ok(HttpResponse::Created().json(issue_token(&token_service, &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let invalid = || AppError::Unauthorized("Invalid username or password.".to_string());

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    Ok(HttpResponse::Ok().json(issue_token(&token_service, &user)?))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists.".to_string()))?;
    let author = state.blog.author_for(&Caller::from(identity)).await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        author: author.map(|a| AuthorResponse {
            id: a.id,
            name: a.name,
            email: a.email,
        }),
    }))
}

fn issue_token(token_service: &Arc<dyn TokenService>, user: &User) -> AppResult<AuthResponse> {
    let token = token_service
        .generate_token(user.id, &user.username, &user.email)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
    })
}
