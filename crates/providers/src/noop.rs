use crate::{FileDescriptor, InferenceError, InferenceInvoker, InferenceOutput, RawResult};
use std::time::Duration;

/// Reports an empty result for every file without running anything.
#[derive(Debug, Default)]
pub struct NoopInvoker;

#[async_trait::async_trait]
impl InferenceInvoker for NoopInvoker {
    async fn invoke(
        &self,
        _model: &str,
        files: &[FileDescriptor],
        _timeout: Duration,
    ) -> Result<Vec<InferenceOutput>, InferenceError> {
        Ok(files
            .iter()
            .map(|f| InferenceOutput {
                file_id: f.file_id,
                result: RawResult::empty(),
            })
            .collect())
    }
}
