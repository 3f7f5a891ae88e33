//! Runs one model over a batch and hands each file's result to the handler of
//! that model.

use crate::error::BatchError;
use crate::faces::FaceHandler;
use crate::jobs::{JobScheduler, SqliteJobList};
use crate::models::ModelKind;
use crate::ownership::{MountOwnership, OwnershipResolver};
use crate::report::BatchReport;
use crate::settings::{backend_mode, AppSettings, ModelStatus, SqliteSettings};
use crate::store::{FaceStore, SqliteFaceStore, SqliteTagStore, TagStore};
use crate::tagger::TagHandler;
use crate::timeout;
use providers::{FileDescriptor, InferenceError, InferenceInvoker, RawResult};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Collaborators the result handlers write to.
#[derive(Clone)]
pub struct Backends {
    pub settings: Arc<dyn AppSettings>,
    pub tags: Arc<dyn TagStore>,
    pub faces: Arc<dyn FaceStore>,
    pub owners: Arc<dyn OwnershipResolver>,
    pub jobs: Arc<dyn JobScheduler>,
}

impl Backends {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            settings: Arc::new(SqliteSettings::new(pool.clone())),
            tags: Arc::new(SqliteTagStore::new(pool.clone())),
            faces: Arc::new(SqliteFaceStore::new(pool.clone())),
            owners: Arc::new(MountOwnership::new(pool.clone())),
            jobs: Arc::new(SqliteJobList::new(pool)),
        }
    }
}

enum Handler<'a> {
    Tags(TagHandler<'a>),
    Faces(FaceHandler<'a>),
}

pub struct Classifier {
    invoker: Arc<dyn InferenceInvoker>,
    backends: Backends,
    status: ModelStatus,
}

impl Classifier {
    pub fn new(invoker: Arc<dyn InferenceInvoker>, backends: Backends) -> Self {
        let status = ModelStatus::new(backends.settings.clone());
        Self {
            invoker,
            backends,
            status,
        }
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    /// Runs `model` over `batch` and pairs every file with its result.
    ///
    /// A file listed more than once is classified once, at its first position.
    /// Files the invoker did not report get an empty result. Any invoker failure
    /// fails the whole batch.
    pub async fn classify_files(
        &self,
        model: &str,
        timeout: Duration,
        batch: &[FileDescriptor],
    ) -> Result<Vec<(FileDescriptor, RawResult)>, InferenceError> {
        let mut seen = HashSet::with_capacity(batch.len());
        let files: Vec<FileDescriptor> = batch
            .iter()
            .filter(|file| {
                let first = seen.insert(file.file_id);
                if !first {
                    debug!(model, file_id = file.file_id, "file listed twice in batch");
                }
                first
            })
            .cloned()
            .collect();

        let outputs = self.invoker.invoke(model, &files, timeout).await?;

        let mut by_file: HashMap<i64, RawResult> = HashMap::with_capacity(outputs.len());
        for output in outputs {
            if !seen.contains(&output.file_id) {
                warn!(model, file_id = output.file_id, "result for a file outside the batch");
                continue;
            }
            if by_file.insert(output.file_id, output.result).is_some() {
                debug!(model, file_id = output.file_id, "duplicate result, keeping the last");
            }
        }

        Ok(files
            .into_iter()
            .map(|file| {
                let raw = by_file.remove(&file.file_id).unwrap_or_default();
                (file, raw)
            })
            .collect())
    }

    pub async fn timeout_for(&self, kind: ModelKind) -> Duration {
        let mode = backend_mode(self.backends.settings.as_ref()).await;
        timeout::resolve(mode, kind.category())
    }

    pub async fn run_model(
        &self,
        model: &str,
        batch: &[FileDescriptor],
    ) -> Result<BatchReport, BatchError> {
        let kind = ModelKind::from_name(model)
            .ok_or_else(|| InferenceError::UnknownModel(model.to_string()))?;
        self.run_batch(kind, batch).await
    }

    /// Classifies `batch` and persists the results.
    ///
    /// Nothing is written unless inference over the whole batch succeeded.
    pub async fn run_batch(
        &self,
        kind: ModelKind,
        batch: &[FileDescriptor],
    ) -> Result<BatchReport, BatchError> {
        let mut report = BatchReport::new(kind.name());
        if batch.is_empty() {
            return Ok(report);
        }

        let timeout = self.timeout_for(kind).await;
        info!(model = kind.name(), files = batch.len(), timeout_secs = timeout.as_secs(), "classifying batch");
        let results = self.classify_files(kind.name(), timeout, batch).await?;

        let mut handler = match kind {
            ModelKind::AudioTags => Handler::Tags(TagHandler::new(
                kind,
                self.backends.tags.as_ref(),
                &self.status,
            )),
            ModelKind::ImageFaces => Handler::Faces(FaceHandler::new(
                kind,
                self.backends.faces.as_ref(),
                self.backends.owners.as_ref(),
                self.backends.jobs.as_ref(),
                &self.status,
            )),
        };

        for (file, raw) in &results {
            report.files += 1;
            if raw.is_empty() {
                report.empty_results += 1;
            }
            match &mut handler {
                Handler::Tags(tags) => tags.handle(file, raw, &mut report).await?,
                Handler::Faces(faces) => faces.handle(file, raw, &mut report).await,
            }
        }
        if let Handler::Faces(faces) = handler {
            faces.finish(&mut report).await;
        }

        info!(
            model = kind.name(),
            files = report.files,
            tags = report.tags_assigned,
            detections = report.detections_inserted,
            row_errors = report.row_errors.len(),
            "batch handled"
        );
        Ok(report)
    }
}
