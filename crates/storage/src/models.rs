use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub model: String,
    pub file_id: i64,
    pub root_id: i64,
    pub path: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileTag {
    pub file_id: i64,
    pub name: String,
    pub confidence: f64,
    pub source: String,
}

/// A face detection row; `vector` holds the embedding as a JSON array.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FaceDetectionRow {
    pub id: i64,
    pub user_id: String,
    pub file_id: i64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub vector: String,
    pub cluster_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewFaceDetection<'a> {
    pub user_id: &'a str,
    pub file_id: i64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub vector: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Mount {
    pub user_id: String,
    pub root_id: i64,
    pub mount_point: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub class: String,
    pub argument: String,
    pub added_at: i64,
}
