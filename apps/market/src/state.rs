//! # Market State
//!
//! Shared state handed to every command.
//!
//! ## Thread Safety
//! `Database` wraps a `SqlitePool`, which is cheap to clone and safe to use
//! from many tasks at once. The configuration is read-only after startup.

use tracing::info;

use course_db::{Database, DbResult};

use crate::config::MarketConfig;

/// Database handle plus configuration.
#[derive(Debug, Clone)]
pub struct MarketState {
    db: Database,
    config: MarketConfig,
}

impl MarketState {
    /// Wraps an already opened database.
    pub fn new(db: Database, config: MarketConfig) -> Self {
        MarketState { db, config }
    }

    /// Opens the database described by `config` and runs migrations.
    pub async fn open(config: MarketConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening market state");
        let db = Database::new(config.db_config()).await?;
        Ok(MarketState::new(db, config))
    }

    /// Returns a reference to the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }
}
