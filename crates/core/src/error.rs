use providers::InferenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not encode record: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Aborts the whole batch; its queue entries stay for a retry.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("could not store tags for file {file_id}: {source}")]
    Tags {
        file_id: i64,
        #[source]
        source: StoreError,
    },
}

/// A single failed row. Logged and skipped, never aborts a batch.
#[derive(Debug, Error)]
pub enum RowError {
    /// The existing detections of a file could not be listed.
    #[error("could not query existing face detections of file {file_id}: {source}")]
    Lookup { file_id: i64, source: StoreError },
    #[error("could not delete face detection {detection_id} of file {file_id}: {source}")]
    Delete {
        file_id: i64,
        detection_id: i64,
        source: StoreError,
    },
    #[error("could not store face detection of file {file_id} for {user_id}: {source}")]
    Insert {
        file_id: i64,
        user_id: String,
        source: StoreError,
    },
    #[error("could not resolve users of root {root_id} for file {file_id}: {source}")]
    Ownership {
        file_id: i64,
        root_id: i64,
        source: StoreError,
    },
    #[error("malformed {model} result for file {file_id}: {source}")]
    Decode {
        file_id: i64,
        model: &'static str,
        source: serde_json::Error,
    },
    #[error("could not mark {model} status: {source}")]
    Status { model: &'static str, source: StoreError },
    #[error("could not schedule clustering for {user_id}: {source}")]
    Schedule { user_id: String, source: StoreError },
}
