//! Database schema and migrations
//!
//! Schema for the offline SQLite collection. Migrations are applied in
//! order and recorded in the `migrations` table.

use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use std::collections::BTreeSet;

/// One schema step of the offline collection
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version; append only
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "manga_schema",
    sql: include_str!("migrations/001_manga_schema.sql"),
}];

/// Bring the offline collection schema up to date
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let applied: BTreeSet<i64> = sqlx::query_scalar::<_, i64>("SELECT version FROM migrations")
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

    // A newer binary may have written versions this one does not know
    if let Some(newest) = applied.last() {
        let known = MIGRATIONS.last().map_or(0, |m| m.version);
        if *newest > known {
            return Err(AppError::Generic(format!(
                "Offline collection schema version {} is newer than supported version {}",
                newest, known
            )));
        }
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();
    if pending.is_empty() {
        tracing::debug!("Offline collection schema is current");
        return Ok(());
    }

    for migration in pending {
        tracing::info!("Applying migration {} ({})", migration.version, migration.name);

        let mut tx = pool.begin().await?;
        for statement in migration.sql.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO migrations (version, name, applied_at) VALUES (?, ?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    tracing::info!(
        "Offline collection schema at version {}",
        MIGRATIONS.last().map_or(0, |m| m.version)
    );
    Ok(())
}
