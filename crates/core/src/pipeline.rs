use crate::classifier::{Backends, Classifier};
use crate::config::AppConfig;
use crate::models::ModelKind;
use crate::report::BatchReport;
use crate::scanner::{self, ScanSummary};
use anyhow::Context;
use providers::noop::NoopInvoker;
use providers::process::{ProcessConfig, ProcessInvoker};
use providers::{FileDescriptor, InferenceInvoker};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use storage::{connect, migrate};
use tracing::{error, info, warn};

pub async fn open(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let pool = connect(&config.database.path).await.context("db connect")?;
    migrate(&pool).await.context("db migrate")?;
    Ok(pool)
}

pub fn model_kind(name: &str) -> anyhow::Result<ModelKind> {
    ModelKind::from_name(name).with_context(|| format!("unknown model: {name}"))
}

pub fn build_invoker(config: &AppConfig) -> Arc<dyn InferenceInvoker> {
    match &config.inference.command {
        Some(command) => Arc::new(ProcessInvoker::new(ProcessConfig {
            command: command.clone(),
            args: config.inference.args.clone(),
            working_dir: config.inference.working_dir.as_ref().map(PathBuf::from),
        })),
        None => {
            warn!("no classifier command configured, every file will yield an empty result");
            Arc::new(NoopInvoker)
        }
    }
}

/// Takes up to `limit` queued files for `kind` and handles them.
///
/// Entries of a handled batch are removed from the queue. If the batch fails
/// they stay queued. Returns `None` when nothing is queued.
pub async fn process_next_batch(
    classifier: &Classifier,
    pool: &SqlitePool,
    kind: ModelKind,
    limit: usize,
) -> anyhow::Result<Option<BatchReport>> {
    let entries = storage::queue::take(pool, kind.name(), limit.max(1) as i64).await?;
    if entries.is_empty() {
        return Ok(None);
    }
    let batch: Vec<FileDescriptor> = entries
        .iter()
        .map(|e| FileDescriptor {
            queue_id: e.id,
            file_id: e.file_id,
            root_id: e.root_id,
            path: PathBuf::from(&e.path),
        })
        .collect();

    let report = match classifier.run_batch(kind, &batch).await {
        Ok(report) => report,
        Err(e) => {
            error!(model = kind.name(), files = batch.len(), error = %e, "batch failed, leaving files queued");
            return Err(e).context(format!("{} batch failed", kind.name()));
        }
    };

    let ids: Vec<i64> = batch.iter().map(|f| f.queue_id).collect();
    storage::queue::remove(pool, &ids).await?;
    Ok(Some(report))
}

/// Handles one batch, or keeps going until the queue is empty when `drain`.
pub async fn run_queue(
    config: &AppConfig,
    kind: ModelKind,
    batch_size: Option<usize>,
    drain: bool,
) -> anyhow::Result<Vec<BatchReport>> {
    let pool = open(config).await?;
    let classifier = Classifier::new(build_invoker(config), Backends::sqlite(pool.clone()));
    let limit = batch_size.unwrap_or(config.inference.batch_size);

    let mut reports = Vec::new();
    while let Some(report) = process_next_batch(&classifier, &pool, kind, limit).await? {
        reports.push(report);
        if !drain {
            break;
        }
    }
    info!(model = kind.name(), batches = reports.len(), "queue run complete");
    Ok(reports)
}

pub async fn scan_roots(config: &AppConfig, kind: ModelKind) -> anyhow::Result<ScanSummary> {
    let pool = open(config).await?;
    let roots: Vec<PathBuf> = config.scan.include.iter().map(PathBuf::from).collect();
    let summary = scanner::scan(&roots, &config.scan.exclude, config.scan.root_id, kind, &pool).await?;
    info!(model = kind.name(), discovered = summary.discovered, enqueued = summary.enqueued, "scan complete");
    Ok(summary)
}
