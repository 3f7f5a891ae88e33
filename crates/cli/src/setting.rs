//! `setting` subcommand helpers.

use anyhow::{bail, Result};
use classify_core::models::ModelKind;
use classify_core::settings::{status_key, AppSettings, APP_NAMESPACE};
use sqlx::SqlitePool;

/// Model status flags are owned by the classifier and never written by hand.
fn is_status_key(key: &str) -> bool {
    ModelKind::ALL
        .iter()
        .any(|kind| status_key(kind.name()) == key)
}

pub async fn set(settings: &dyn AppSettings, key: &str, value: &str) -> Result<()> {
    if is_status_key(key) {
        bail!("{key} is set by classification and cannot be changed");
    }
    settings.set_app_value(APP_NAMESPACE, key, value).await?;
    tracing::info!(key, value, "setting stored");
    Ok(())
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<(String, String)>> {
    Ok(storage::app_config::list(pool, APP_NAMESPACE).await?)
}
