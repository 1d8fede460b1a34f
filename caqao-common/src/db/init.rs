//! Database initialization
//!
//! Opens (creating if needed) the SQLite database and creates the three
//! CAQAO tables: `users`, `detections` (promoted records) and
//! `temp_detections` (scratch records).

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout for all pooled connections
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Per-connection settings: every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Idempotent - safe to call multiple times
    create_users_table(&pool).await?;
    create_detections_table(&pool).await?;
    create_temp_detections_table(&pool).await?;

    Ok(pool)
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_detections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS detections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER REFERENCES users(id),
            image BLOB NOT NULL,
            filename TEXT NOT NULL,
            mimetype TEXT NOT NULL,
            bean_grade TEXT NOT NULL,
            very_dark_brown INTEGER NOT NULL DEFAULT 0,
            brown INTEGER NOT NULL DEFAULT 0,
            partly_purple INTEGER NOT NULL DEFAULT 0,
            total_purple INTEGER NOT NULL DEFAULT 0,
            g1 INTEGER NOT NULL DEFAULT 0,
            g2 INTEGER NOT NULL DEFAULT 0,
            g3 INTEGER NOT NULL DEFAULT 0,
            g4 INTEGER NOT NULL DEFAULT 0,
            mouldy INTEGER NOT NULL DEFAULT 0,
            insect_infested INTEGER NOT NULL DEFAULT 0,
            slaty INTEGER NOT NULL DEFAULT 0,
            germinated INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL,
            saved_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_detections_filename ON detections(filename)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_temp_detections_table(pool: &SqlitePool) -> Result<()> {
    // AUTOINCREMENT keeps ids increasing across purges, so "highest id" is
    // always the most recent assessment
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS temp_detections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            image BLOB NOT NULL,
            filename TEXT NOT NULL,
            mimetype TEXT NOT NULL,
            bean_grade TEXT NOT NULL,
            very_dark_brown INTEGER NOT NULL DEFAULT 0,
            brown INTEGER NOT NULL DEFAULT 0,
            partly_purple INTEGER NOT NULL DEFAULT 0,
            total_purple INTEGER NOT NULL DEFAULT 0,
            g1 INTEGER NOT NULL DEFAULT 0,
            g2 INTEGER NOT NULL DEFAULT 0,
            g3 INTEGER NOT NULL DEFAULT 0,
            g4 INTEGER NOT NULL DEFAULT 0,
            mouldy INTEGER NOT NULL DEFAULT 0,
            insect_infested INTEGER NOT NULL DEFAULT 0,
            slaty INTEGER NOT NULL DEFAULT 0,
            germinated INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_temp_detections_filename ON temp_detections(filename)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
