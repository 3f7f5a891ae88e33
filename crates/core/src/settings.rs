//! Runtime application values and the per-model status flag.

use crate::error::StoreError;
use crate::timeout::BackendMode;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const APP_NAMESPACE: &str = "classify";
pub const PORTABLE_BACKEND_KEY: &str = "inference.portable";

#[async_trait::async_trait]
pub trait AppSettings: Send + Sync {
    async fn get_app_value(
        &self,
        namespace: &str,
        key: &str,
        default: &str,
    ) -> Result<String, StoreError>;

    async fn set_app_value(&self, namespace: &str, key: &str, value: &str)
        -> Result<(), StoreError>;
}

pub struct SqliteSettings {
    pool: SqlitePool,
}

impl SqliteSettings {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AppSettings for SqliteSettings {
    async fn get_app_value(
        &self,
        namespace: &str,
        key: &str,
        default: &str,
    ) -> Result<String, StoreError> {
        Ok(storage::app_config::get(&self.pool, namespace, key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set_app_value(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        storage::app_config::set(&self.pool, namespace, key, value).await?;
        Ok(())
    }
}

/// Reads the backend flag, assuming native when it cannot be read.
pub async fn backend_mode(settings: &dyn AppSettings) -> BackendMode {
    match settings
        .get_app_value(APP_NAMESPACE, PORTABLE_BACKEND_KEY, "false")
        .await
    {
        Ok(value) => BackendMode::from_flag(&value),
        Err(e) => {
            warn!(error = %e, "could not read backend mode, assuming native");
            BackendMode::Native
        }
    }
}

pub fn status_key(model: &str) -> String {
    format!("{model}.status")
}

/// "Model has produced at least one result" flags.
///
/// Absent means false. The only transition is to true; there is no way to clear
/// a flag through this type.
#[derive(Clone)]
pub struct ModelStatus {
    settings: Arc<dyn AppSettings>,
    marked: Arc<Mutex<HashSet<String>>>,
}

impl ModelStatus {
    pub fn new(settings: Arc<dyn AppSettings>) -> Self {
        Self {
            settings,
            marked: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn is_ready(&self, model: &str) -> Result<bool, StoreError> {
        let value = self
            .settings
            .get_app_value(APP_NAMESPACE, &status_key(model), "false")
            .await?;
        Ok(value == "true")
    }

    /// Writes the flag once per process and model.
    pub async fn mark_ready(&self, model: &str) -> Result<(), StoreError> {
        if self.already_marked(model) {
            return Ok(());
        }
        self.settings
            .set_app_value(APP_NAMESPACE, &status_key(model), "true")
            .await?;
        if let Ok(mut marked) = self.marked.lock() {
            marked.insert(model.to_string());
        }
        debug!(model, "model status set");
        Ok(())
    }

    fn already_marked(&self, model: &str) -> bool {
        self.marked
            .lock()
            .map(|m| m.contains(model))
            .unwrap_or(false)
    }
}
