//! # Schema
//!
//! The market schema ships inside the binary. Files under
//! `migrations/sqlite/` are applied once each, in filename order, and
//! recorded in `_sqlx_migrations`.
//!
//! New tables or columns go in a new `NNN_<what>.sql` file. Applied files
//! are checksummed, so editing one breaks every existing database.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(known = MIGRATOR.migrations.len(), "Applying market schema");
    MIGRATOR.run(pool).await?;
    info!("Market schema up to date");
    Ok(())
}

/// `(known, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
