use anyhow::{Context, Result};
use std::sync::Arc;

use crate::analysis::AnalysisClient;
use crate::auth::AuthManager;
use crate::config::Config;
use crate::db::{self, DbPool};

/// Application context containing shared dependencies
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: Arc<DbPool>,
    pub auth_manager: Arc<AuthManager>,
    pub analysis_client: Arc<AnalysisClient>,
    pub config: Arc<Config>,
}

impl AppContext {
    /// Creates a new application context
    pub fn new(
        db_pool: Arc<DbPool>,
        auth_manager: Arc<AuthManager>,
        analysis_client: Arc<AnalysisClient>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            db_pool,
            auth_manager,
            analysis_client,
            config,
        }
    }

    /// Connect, migrate, seed the default accounts and build the clients
    pub async fn initialize(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        tracing::info!("Connecting to database...");
        let db_pool = db::create_pool(&config.database_url, &config.db).await?;
        db::run_migrations(&db_pool).await?;
        tracing::info!("Database ready");

        let seeded =
            db::users::seed_default_users(&db_pool, &config.seed, config.security.bcrypt_cost)
                .await
                .context("Failed to seed default users")?;
        if seeded > 0 {
            tracing::info!(count = seeded, "Default accounts created");
        }

        let auth_manager =
            AuthManager::new(&config).context("Failed to initialize auth manager")?;
        let analysis_client = AnalysisClient::new(&config.analysis)
            .context("Failed to initialize analysis client")?;

        tracing::info!(
            analysis_url = %analysis_client.base_url(),
            upload_dir = %config.analysis.upload_dir.display(),
            "Analysis service client ready"
        );

        Ok(Self::new(
            Arc::new(db_pool),
            Arc::new(auth_manager),
            Arc::new(analysis_client),
            config,
        ))
    }
}
