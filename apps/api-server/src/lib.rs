//! # Quill API Server
//!
//! Actix-web application for the Quill blog: routes, extractors, error
//! mapping and startup wiring. The binary in `main.rs` only loads
//! configuration and runs the server built here.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;

use actix_web::web;

use middleware::error::{json_config, path_config, query_config};
use state::AppState;

/// Register shared state, extractor settings and all routes.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state.tokens.clone()))
            .app_data(web::Data::new(state.passwords.clone()))
            .app_data(web::Data::new(state))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .configure(handlers::configure_routes);
    }
}
