//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer};
use tracing_actix_web::TracingLogger;

use api_server::config::AppConfig;
use api_server::configure_app;
use api_server::observability::tag_request;
use api_server::state::AppState;
use api_server::telemetry::{self, LogFormat};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Tracing first so configuration warnings are recorded
    telemetry::init_telemetry(LogFormat::from_env());
    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await.inspect_err(|e| {
        tracing::error!(error = %e, "Failed to initialize application state");
    })?;

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(from_fn(tag_request))
            .configure(configure_app(state.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
