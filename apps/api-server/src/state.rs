//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::BlogService;
use quill_core::ports::{PasswordService, TokenService, UserRepository};
use quill_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

use crate::config::AppConfig;

/// Which backend holds the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    Memory,
}

impl Storage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Storage::Postgres => "postgres",
            Storage::Memory => "memory",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: BlogService,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub storage: Storage,
}

impl AppState {
    /// Build the state for `config`, connecting to PostgreSQL when a
    /// database is configured. A configured database that cannot be reached
    /// is an error, not a silent switch to memory.
    pub async fn new(config: &AppConfig) -> std::io::Result<Self> {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running with the in-memory store.");
            return Ok(Self::in_memory(config.jwt.clone()));
        };

        #[cfg(feature = "postgres")]
        {
            use quill_infra::DatabaseConnections;
            use quill_infra::database::{
                PostgresAuthorRepository, PostgresCommentRepository, PostgresPostRepository,
                PostgresUserRepository,
            };

            let connections = DatabaseConnections::init(db_config)
                .await
                .map_err(std::io::Error::other)?;

            if config.run_migrations {
                use migration::MigratorTrait;

                tracing::info!("Applying pending migrations");
                migration::Migrator::up(&connections.main, None)
                    .await
                    .map_err(std::io::Error::other)?;
            }

            let db = connections.main;
            let blog = BlogService::new(
                Arc::new(PostgresAuthorRepository::new(db.clone())),
                Arc::new(PostgresPostRepository::new(db.clone())),
                Arc::new(PostgresCommentRepository::new(db.clone())),
            );

            tracing::info!("Application state initialized");
            return Ok(Self::with_services(
                blog,
                Arc::new(PostgresUserRepository::new(db)),
                config.jwt.clone(),
                Storage::Postgres,
            ));
        }

        #[cfg(not(feature = "postgres"))]
        {
            let _ = db_config;
            tracing::warn!(
                "Built without the postgres feature - ignoring DATABASE_URL, using the in-memory store"
            );
            return Ok(Self::in_memory(config.jwt.clone()));
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(jwt: JwtConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let blog = BlogService::new(store.clone(), store.clone(), store.clone());

        Self::with_services(blog, store, jwt, Storage::Memory)
    }

    fn with_services(
        blog: BlogService,
        users: Arc<dyn UserRepository>,
        jwt: JwtConfig,
        storage: Storage,
    ) -> Self {
        Self {
            blog,
            users,
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::default()),
            storage,
        }
    }
}
