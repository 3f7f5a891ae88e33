//! Runs an external classifier command as a child process.
//!
//! Requests go to stdin as JSON lines (`{"file_id":..,"path":..}`), results
//! come back on stdout as JSON lines (`{"file_id":..,"result":..}`).

use crate::{FileDescriptor, InferenceError, InferenceInvoker, InferenceOutput};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    cfg: Arc<ProcessConfig>,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    file_id: i64,
    path: &'a Path,
}

impl ProcessInvoker {
    pub fn new(cfg: ProcessConfig) -> Self {
        Self { cfg: Arc::new(cfg) }
    }

    async fn run(
        &self,
        model: &str,
        files: &[FileDescriptor],
    ) -> Result<Vec<InferenceOutput>, InferenceError> {
        let mut request = Vec::new();
        for file in files {
            let line = serde_json::to_vec(&InferenceRequest {
                file_id: file.file_id,
                path: &file.path,
            })
            .map_err(std::io::Error::from)?;
            request.extend_from_slice(&line);
            request.push(b'\n');
        }

        let mut cmd = Command::new(&self.cfg.command);
        cmd.args(&self.cfg.args)
            .arg(model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cfg.working_dir {
            cmd.current_dir(dir);
        }
        let mut child = cmd.spawn().map_err(InferenceError::Spawn)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| InferenceError::Process("stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| InferenceError::Process("stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| InferenceError::Process("stderr not captured".to_string()))?;

        let writer = tokio::spawn(async move {
            stdin.write_all(&request).await?;
            stdin.shutdown().await
        });
        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut outputs = Vec::with_capacity(files.len());
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<InferenceOutput>(line) {
                Ok(output) => outputs.push(output),
                Err(e) => warn!(model, error = %e, "skipping unparseable classifier output"),
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_reader.await.unwrap_or_default();
        // A classifier may exit before draining stdin.
        if let Ok(Err(e)) = writer.await {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(InferenceError::Io(e));
            }
        }
        if !status.success() {
            return Err(InferenceError::Process(format!(
                "{} exited with {}: {}",
                self.cfg.command,
                status,
                stderr.trim()
            )));
        }
        debug!(model, results = outputs.len(), "classifier process finished");
        Ok(outputs)
    }
}

#[async_trait::async_trait]
impl InferenceInvoker for ProcessInvoker {
    async fn invoke(
        &self,
        model: &str,
        files: &[FileDescriptor],
        timeout: Duration,
    ) -> Result<Vec<InferenceOutput>, InferenceError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        match tokio::time::timeout(timeout, self.run(model, files)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(model, timeout_secs = timeout.as_secs(), "classifier timed out");
                Err(InferenceError::Timeout {
                    model: model.to_string(),
                    timeout,
                })
            }
        }
    }
}
