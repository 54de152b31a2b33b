//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;

use actix_web::web;

/// Configure all application routes. Collection and item paths answer with
/// and without the trailing slash.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Blog routes
            .service(
                web::resource(["/posts", "/posts/"])
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .service(
                web::resource(["/posts/{id}", "/posts/{id}/"])
                    .route(web::get().to(posts::post_detail)),
            )
            .service(
                web::resource(["/posts/{id}/edit", "/posts/{id}/edit/"])
                    .route(web::patch().to(posts::update_post)),
            )
            .service(
                web::resource(["/posts/{id}/delete", "/posts/{id}/delete/"])
                    .route(web::delete().to(posts::delete_post)),
            )
            .service(
                web::resource(["/comments", "/comments/"])
                    .route(web::post().to(comments::create_comment)),
            ),
    );
}
