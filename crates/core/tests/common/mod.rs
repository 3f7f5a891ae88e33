#![allow(dead_code)]

use classify_core::classifier::{Backends, Classifier};
use classify_core::error::StoreError;
use classify_core::jobs::{JobKind, JobScheduler};
use classify_core::models::{FaceDetection, StoredFaceDetection, TagAssignment};
use classify_core::ownership::OwnershipResolver;
use classify_core::settings::AppSettings;
use classify_core::store::{FaceStore, TagStore};
use providers::{FileDescriptor, InferenceError, InferenceInvoker, InferenceOutput, RawResult};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn file(file_id: i64, root_id: i64) -> FileDescriptor {
    FileDescriptor {
        queue_id: file_id * 10,
        file_id,
        root_id,
        path: PathBuf::from(format!("/data/{file_id}")),
    }
}

pub fn unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

fn timeout_error(model: &str, timeout: Duration) -> InferenceError {
    InferenceError::Timeout {
        model: model.to_string(),
        timeout,
    }
}

fn process_error(_model: &str, _timeout: Duration) -> InferenceError {
    InferenceError::Process("classifier exited with signal 9".to_string())
}

/// Replies with canned outputs, or with an error built by `fail`.
#[derive(Default)]
pub struct FakeInvoker {
    pub outputs: Mutex<Vec<InferenceOutput>>,
    pub fail: Option<fn(&str, Duration) -> InferenceError>,
    pub calls: Mutex<Vec<(String, usize, Duration)>>,
}

impl FakeInvoker {
    pub fn replying(outputs: Vec<(i64, serde_json::Value)>) -> Self {
        Self {
            outputs: Mutex::new(
                outputs
                    .into_iter()
                    .map(|(file_id, v)| InferenceOutput {
                        file_id,
                        result: RawResult(v),
                    })
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn timing_out() -> Self {
        Self {
            fail: Some(timeout_error),
            ..Self::default()
        }
    }

    pub fn crashing() -> Self {
        Self {
            fail: Some(process_error),
            ..Self::default()
        }
    }

    pub fn set_outputs(&self, outputs: Vec<(i64, serde_json::Value)>) {
        *self.outputs.lock().unwrap() = outputs
            .into_iter()
            .map(|(file_id, v)| InferenceOutput {
                file_id,
                result: RawResult(v),
            })
            .collect();
    }

    pub fn last_timeout(&self) -> Option<Duration> {
        self.calls.lock().unwrap().last().map(|c| c.2)
    }
}

#[async_trait::async_trait]
impl InferenceInvoker for FakeInvoker {
    async fn invoke(
        &self,
        model: &str,
        files: &[FileDescriptor],
        timeout: Duration,
    ) -> Result<Vec<InferenceOutput>, InferenceError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), files.len(), timeout));
        if let Some(fail) = self.fail {
            return Err(fail(model, timeout));
        }
        Ok(self.outputs.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemSettings {
    pub values: Mutex<HashMap<(String, String), String>>,
    pub writes: Mutex<usize>,
}

impl MemSettings {
    pub fn with(namespace: &str, key: &str, value: &str) -> Self {
        let settings = Self::default();
        settings
            .values
            .lock()
            .unwrap()
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        settings
    }

    pub fn value(&self, namespace: &str, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait::async_trait]
impl AppSettings for MemSettings {
    async fn get_app_value(
        &self,
        namespace: &str,
        key: &str,
        default: &str,
    ) -> Result<String, StoreError> {
        Ok(self
            .value(namespace, key)
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set_app_value(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        *self.writes.lock().unwrap() += 1;
        self.values
            .lock()
            .unwrap()
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemTags {
    pub rows: Mutex<Vec<(String, TagAssignment)>>,
    pub fail: bool,
}

#[async_trait::async_trait]
impl TagStore for MemTags {
    async fn insert(&self, source: &str, tag: &TagAssignment) -> Result<(), StoreError> {
        if self.fail {
            return Err(unavailable());
        }
        self.rows
            .lock()
            .unwrap()
            .push((source.to_string(), tag.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemFaces {
    pub rows: Mutex<Vec<StoredFaceDetection>>,
    pub next_id: Mutex<i64>,
    pub fail_lookup: bool,
    pub fail_delete: HashSet<i64>,
    pub fail_insert_for: HashSet<String>,
    /// Records "delete:<file>" and "insert:<file>" in call order.
    pub log: Mutex<Vec<String>>,
}

impl MemFaces {
    pub fn seed(&self, user_id: &str, file_id: i64, vector: Vec<f32>) -> i64 {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        self.rows.lock().unwrap().push(StoredFaceDetection {
            id: *next,
            detection: FaceDetection {
                user_id: user_id.to_string(),
                file_id,
                bbox: classify_core::models::BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: 1.0,
                    height: 1.0,
                },
                vector,
            },
        });
        *next
    }

    pub fn all(&self) -> Vec<StoredFaceDetection> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FaceStore for MemFaces {
    async fn find_by_file_id(&self, file_id: i64) -> Result<Vec<StoredFaceDetection>, StoreError> {
        if self.fail_lookup {
            return Err(unavailable());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.detection.file_id == file_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, detection: &FaceDetection) -> Result<i64, StoreError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("insert:{}", detection.file_id));
        if self.fail_insert_for.contains(&detection.user_id) {
            return Err(unavailable());
        }
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        self.rows.lock().unwrap().push(StoredFaceDetection {
            id: *next,
            detection: detection.clone(),
        });
        Ok(*next)
    }

    async fn delete(&self, detection: &StoredFaceDetection) -> Result<(), StoreError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("delete:{}", detection.detection.file_id));
        if self.fail_delete.contains(&detection.id) {
            return Err(unavailable());
        }
        self.rows.lock().unwrap().retain(|r| r.id != detection.id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemOwners {
    pub roots: HashMap<i64, BTreeSet<String>>,
    pub fail: bool,
}

impl MemOwners {
    pub fn with(root_id: i64, users: &[&str]) -> Self {
        let mut roots = HashMap::new();
        roots.insert(root_id, users.iter().map(|u| u.to_string()).collect());
        Self { roots, fail: false }
    }
}

#[async_trait::async_trait]
impl OwnershipResolver for MemOwners {
    async fn users_for_root(&self, root_id: i64) -> Result<BTreeSet<String>, StoreError> {
        if self.fail {
            return Err(unavailable());
        }
        Ok(self.roots.get(&root_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemJobs {
    pub queued: Mutex<Vec<String>>,
    pub enqueue_calls: Mutex<usize>,
}

impl MemJobs {
    pub fn queued(&self) -> Vec<String> {
        self.queued.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobScheduler for MemJobs {
    async fn exists(&self, kind: JobKind, user_id: &str) -> Result<bool, StoreError> {
        assert_eq!(kind, JobKind::ClusterFaces);
        Ok(self.queued.lock().unwrap().iter().any(|u| u == user_id))
    }

    async fn enqueue(&self, _kind: JobKind, user_id: &str) -> Result<(), StoreError> {
        *self.enqueue_calls.lock().unwrap() += 1;
        self.queued.lock().unwrap().push(user_id.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub invoker: Arc<FakeInvoker>,
    pub settings: Arc<MemSettings>,
    pub tags: Arc<MemTags>,
    pub faces: Arc<MemFaces>,
    pub owners: Arc<MemOwners>,
    pub jobs: Arc<MemJobs>,
}

impl Harness {
    pub fn new(invoker: FakeInvoker) -> Self {
        Self {
            invoker: Arc::new(invoker),
            settings: Arc::new(MemSettings::default()),
            tags: Arc::new(MemTags::default()),
            faces: Arc::new(MemFaces::default()),
            owners: Arc::new(MemOwners::default()),
            jobs: Arc::new(MemJobs::default()),
        }
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(
            self.invoker.clone(),
            Backends {
                settings: self.settings.clone(),
                tags: self.tags.clone(),
                faces: self.faces.clone(),
                owners: self.owners.clone(),
                jobs: self.jobs.clone(),
            },
        )
    }

    pub fn status(&self, model: &str) -> Option<String> {
        self.settings.value("classify", &format!("{model}.status"))
    }
}
