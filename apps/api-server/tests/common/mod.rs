//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::from_fn;
use actix_web::{App, test};
use serde_json::{Value, json};

use api_server::configure_app;
use api_server::observability::tag_request;
use api_server::state::AppState;
use quill_infra::JwtConfig;

/// Application over a fresh in-memory store.
pub fn app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = AppState::in_memory(jwt_config());

    App::new()
        .wrap(from_fn(tag_request))
        .configure(configure_app(state))
}

/// Token settings shared by the test application.
pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-secret".to_string(),
        expiration_hours: 1,
        issuer: "quill-test".to_string(),
    }
}

pub fn register(username: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct horse battery",
        }))
}

/// `Authorization` header for a token.
pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

/// The access token of an auth response body.
pub fn token(body: &Value) -> String {
    body["access_token"]
        .as_str()
        .expect("response carries an access token")
        .to_string()
}

pub fn new_post(title: &str, author_name: &str, published_date: &str, active: bool) -> Value {
    json!({
        "title": title,
        "content": format!("{title} body"),
        "published_date": published_date,
        "author_name": author_name,
        "active": active,
    })
}

pub fn create_post(token: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/posts/")
        .insert_header(bearer(token))
        .set_json(body)
}

/// Titles of a listing response, in order.
pub fn titles(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .expect("listing has results")
        .iter()
        .map(|p| p["title"].as_str().unwrap_or_default().to_string())
        .collect()
}
