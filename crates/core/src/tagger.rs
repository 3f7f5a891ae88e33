use crate::error::{BatchError, RowError};
use crate::models::{decode_tags, ModelKind, TagAssignment};
use crate::report::BatchReport;
use crate::settings::ModelStatus;
use crate::store::TagStore;
use providers::{FileDescriptor, RawResult};
use tracing::{debug, error};

/// Turns label output into tag assignments.
///
/// Earlier tags of a file are left in place.
pub struct TagHandler<'a> {
    model: ModelKind,
    tags: &'a dyn TagStore,
    status: &'a ModelStatus,
}

impl<'a> TagHandler<'a> {
    pub fn new(model: ModelKind, tags: &'a dyn TagStore, status: &'a ModelStatus) -> Self {
        Self {
            model,
            tags,
            status,
        }
    }

    /// A failed tag insert fails the batch.
    pub async fn handle(
        &self,
        file: &FileDescriptor,
        raw: &RawResult,
        report: &mut BatchReport,
    ) -> Result<(), BatchError> {
        let labels = match decode_tags(raw) {
            Ok(labels) => labels,
            Err(source) => {
                error!(file_id = file.file_id, error = %source, "could not decode tag result");
                report.record(RowError::Decode {
                    file_id: file.file_id,
                    model: self.model.name(),
                    source,
                });
                return Ok(());
            }
        };
        if labels.is_empty() {
            return Ok(());
        }

        for label in labels {
            let tag = TagAssignment {
                file_id: file.file_id,
                label: label.label,
                score: label.score,
            };
            self.tags
                .insert(self.model.name(), &tag)
                .await
                .map_err(|source| BatchError::Tags {
                    file_id: file.file_id,
                    source,
                })?;
            report.tags_assigned += 1;
        }
        debug!(file_id = file.file_id, "file tagged");

        if let Err(source) = self.status.mark_ready(self.model.name()).await {
            error!(model = self.model.name(), error = %source, "could not set model status");
            report.record(RowError::Status {
                model: self.model.name(),
                source,
            });
        }
        Ok(())
    }
}
