use anyhow::Result;
use classify_core::jobs::{argument_user, JobKind};
use classify_core::models::ModelKind;
use classify_core::settings::{backend_mode, ModelStatus, SqliteSettings};
use classify_core::timeout::{self, BackendMode};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ModelView {
    pub model: String,
    pub ready: bool,
    pub queued: i64,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub backend: String,
    pub models: Vec<ModelView>,
    pub clustering_jobs: i64,
    /// Users with a pending clustering job, in the order they were requested.
    pub clustering_users: Vec<String>,
}

pub async fn collect(pool: &SqlitePool) -> Result<StatusView> {
    let settings = Arc::new(SqliteSettings::new(pool.clone()));
    let mode = backend_mode(settings.as_ref()).await;
    let status = ModelStatus::new(settings);

    let mut models = Vec::new();
    for kind in ModelKind::ALL {
        models.push(ModelView {
            model: kind.name().to_string(),
            ready: status.is_ready(kind.name()).await?,
            queued: storage::queue::count(pool, kind.name()).await?,
            timeout_secs: timeout::resolve(mode, kind.category()).as_secs(),
        });
    }

    let class = JobKind::ClusterFaces.class();
    let clustering_users = storage::jobs::list(pool, class)
        .await?
        .iter()
        .filter_map(|job| argument_user(&job.argument))
        .collect();

    Ok(StatusView {
        backend: match mode {
            BackendMode::Native => "native",
            BackendMode::Portable => "portable",
        }
        .to_string(),
        models,
        clustering_jobs: storage::jobs::count(pool, class).await?,
        clustering_users,
    })
}
