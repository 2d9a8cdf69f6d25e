//! Application context shared by the CLI and the web service

use crate::config::{ImportConfig, TomlConfig};
use crate::db::{init_database, load_vote_acceptance, set_setting, VOTE_ACCEPTANCE_KEY};
use crate::model::{ADMIN_EMAIL, VOTE_ACCEPTANCE};
use crate::registry::ResourceRegistry;
use crate::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Database handle, resource registry and runtime policy, built once at startup
#[derive(Clone)]
pub struct AppContext {
    pub db: SqlitePool,
    pub registry: Arc<ResourceRegistry>,
    /// Up-votes needed for automatic acceptance
    pub vote_acceptance: i64,
    pub admin_email: String,
    pub import: ImportConfig,
}

impl AppContext {
    pub fn new(db: SqlitePool, registry: ResourceRegistry) -> Self {
        Self {
            db,
            registry: Arc::new(registry),
            vote_acceptance: VOTE_ACCEPTANCE,
            admin_email: ADMIN_EMAIL.to_string(),
            import: ImportConfig::default(),
        }
    }

    /// Open the database and build the registry described by `config`
    ///
    /// A `vote_acceptance` value in the TOML file is written to the settings
    /// table before the effective quorum is read back.
    pub async fn from_config(config: &TomlConfig, db_path: &Path) -> Result<Self> {
        let db = init_database(db_path).await?;
        let registry = ResourceRegistry::from_config(&config.resources)?;

        if let Some(quorum) = config.vote_acceptance {
            if quorum < 1 {
                return Err(Error::Config(format!(
                    "{} must be at least 1, got {}",
                    VOTE_ACCEPTANCE_KEY, quorum
                )));
            }
            set_setting(&db, VOTE_ACCEPTANCE_KEY, &quorum.to_string()).await?;
        }
        let vote_acceptance = load_vote_acceptance(&db).await?;
        info!("Vote acceptance quorum: {}", vote_acceptance);

        Ok(Self {
            db,
            registry: Arc::new(registry),
            vote_acceptance,
            admin_email: config.admin_email.clone(),
            import: config.import.clone(),
        })
    }

    /// Curator emails for bulk imports, defaulting to the admin account
    pub fn curator_emails(&self) -> Vec<String> {
        if self.import.curators.is_empty() {
            vec![self.admin_email.clone()]
        } else {
            self.import.curators.clone()
        }
    }
}
