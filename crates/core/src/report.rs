use crate::error::RowError;
use serde::{Serialize, Serializer};

/// Outcome of one handled batch.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub model: String,
    pub files: usize,
    pub empty_results: usize,
    pub tags_assigned: usize,
    pub detections_deleted: usize,
    pub detections_inserted: usize,
    /// Distinct users that received at least one new detection.
    pub users_to_cluster: Vec<String>,
    /// Users for which a clustering job was enqueued by this batch.
    pub jobs_enqueued: Vec<String>,
    #[serde(serialize_with = "messages")]
    pub row_errors: Vec<RowError>,
}

impl BatchReport {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, error: RowError) {
        self.row_errors.push(error);
    }

    pub fn is_clean(&self) -> bool {
        self.row_errors.is_empty()
    }
}

fn messages<S: Serializer>(errors: &[RowError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}
