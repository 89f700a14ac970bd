//! Application state wiring services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. `SessionService` is generic over the repository trait; AppState pins
//! it to the SQLite implementation.

use std::path::PathBuf;
use std::sync::Arc;

use skillcheck_core::service::session::SessionService;
use skillcheck_infra::config::load_global_config;
use skillcheck_infra::filesystem::ensure_data_dir;
use skillcheck_infra::sqlite::pool::{DatabasePool, default_database_url};
use skillcheck_infra::sqlite::session::SqliteSessionRepository;
use skillcheck_types::config::GlobalConfig;

/// Concrete type alias for the service generic pinned to the infra implementation.
pub type ConcreteSessionService = SessionService<SqliteSessionRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<ConcreteSessionService>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: resolve the data dir, load config,
    /// connect to the database, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = ensure_data_dir().await?;
        let config = load_global_config(&data_dir).await;
        Self::with_database(&default_database_url(), data_dir, config).await
    }

    /// Wire services against an explicit database URL.
    pub async fn with_database(
        database_url: &str,
        data_dir: PathBuf,
        config: GlobalConfig,
    ) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(database_url).await?;
        let session_service =
            SessionService::new(SqliteSessionRepository::new(db_pool), config.max_notes_length);

        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");

        Ok(Self {
            session_service: Arc::new(session_service),
            config: Arc::new(config),
            data_dir,
        })
    }
}
