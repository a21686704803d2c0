use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::utils::AppError;

/// Shared server state
///
/// Holds the configuration, the embedded database and the JWT service.
/// Cloning is cheap: the database handle and the JWT service are shared.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(config: Config, db: DbService, jwt_service: Arc<JwtService>) -> Self {
        Self {
            config,
            db,
            jwt_service,
        }
    }

    /// Initialize the state for a real server run
    ///
    /// Creates the work directory structure and opens the on-disk database
    /// at `work_dir/database/rewards.db`.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db_dir = config.database_dir();
        std::fs::create_dir_all(&db_dir).map_err(|e| {
            AppError::internal(format!("Failed to create database directory: {e}"))
        })?;

        let db_path = db_dir.join("rewards.db");
        let db = DbService::new(&db_path.to_string_lossy()).await?;
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Ok(Self::new(config.clone(), db, jwt_service))
    }

    /// State backed by an in-memory database; used by the test suites
    pub async fn for_tests() -> Result<Self, AppError> {
        let config = Config::with_overrides("/tmp/rewards-test", 0);
        let db = DbService::memory().await?;
        let jwt_service = Arc::new(JwtService::with_config(crate::auth::JwtConfig {
            secret: "test-secret-key-at-least-32-characters!".to_string(),
            expiration_minutes: 60,
            issuer: "rewards-server".to_string(),
            audience: "rewards-clients".to_string(),
        }));
        Ok(Self::new(config, db, jwt_service))
    }
}
