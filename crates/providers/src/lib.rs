//! Inference provider abstractions.
//!
//! An invoker runs one model over a batch of queued files and reports one
//! raw, model-specific payload per file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod noop;
pub mod process;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model {model} exceeded its budget of {timeout:?}")]
    Timeout { model: String, timeout: Duration },
    #[error("classifier process failed: {0}")]
    Process(String),
    #[error("could not start classifier process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("classifier i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown model: {0}")]
    UnknownModel(String),
}

/// One physical file taken from the queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub queue_id: i64,
    pub file_id: i64,
    pub root_id: i64,
    pub path: PathBuf,
}

/// Untyped payload produced by a model for a single file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawResult(pub serde_json::Value);

impl RawResult {
    pub fn empty() -> Self {
        Self(serde_json::Value::Null)
    }

    /// `null`, `[]` and `{}` all mean the model found nothing.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for RawResult {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A result line as reported by the invoker, keyed by file id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceOutput {
    pub file_id: i64,
    #[serde(default)]
    pub result: RawResult,
}

#[async_trait::async_trait]
pub trait InferenceInvoker: Send + Sync {
    /// Runs `model` over `files`, failing as a whole if `timeout` elapses.
    ///
    /// Outputs may arrive in any order and may omit files.
    async fn invoke(
        &self,
        model: &str,
        files: &[FileDescriptor],
        timeout: Duration,
    ) -> Result<Vec<InferenceOutput>, InferenceError>;
}
