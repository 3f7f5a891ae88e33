//! SQLite persistence for the classifier: pool setup, migrations and one
//! query module per table.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

pub mod app_config;
pub mod faces;
pub mod files;
pub mod jobs;
pub mod models;
pub mod mounts;
pub mod queue;
pub mod tags;

/// Accepts either a `sqlite:` URL or a plain file path. Missing database files
/// and their parent directories are created.
pub async fn connect(database: &str) -> anyhow::Result<SqlitePool> {
    let in_memory = database.contains(":memory:") || database.contains("mode=memory");
    let options = if database.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(database)?.create_if_missing(true)
    } else {
        let path = Path::new(database);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
    };

    let pool = if in_memory {
        // Every connection to an in-memory database sees its own copy.
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
    .connect_with(options)
    .await?;

    tracing::debug!(database, in_memory, "database connected");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
