//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` at the workspace root are compiled
//! into the binary and applied in sequence on every open. Applied versions
//! are recorded in `_sqlx_migrations`, so reopening a migrated file is a
//! no-op.
//!
//! Schema changes go in a new `NNN_description.sql`; shipped files are
//! never edited. Data fix-ups that need Rust (hashing legacy passwords) run
//! after migration in `UserRepository::upgrade_legacy_records`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)`. A missing bookkeeping table counts as zero
/// applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((MIGRATOR.migrations.len(), applied.max(0) as usize))
}
