//! Durable records produced by the result handlers.

use crate::error::StoreError;
use crate::models::{BoundingBox, FaceDetection, StoredFaceDetection, TagAssignment};
use sqlx::SqlitePool;
use storage::models::{FaceDetectionRow, NewFaceDetection};
use tracing::warn;

#[async_trait::async_trait]
pub trait TagStore: Send + Sync {
    /// `source` names the model that produced the tag.
    async fn insert(&self, source: &str, tag: &TagAssignment) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
pub trait FaceStore: Send + Sync {
    async fn find_by_file_id(&self, file_id: i64) -> Result<Vec<StoredFaceDetection>, StoreError>;
    async fn insert(&self, detection: &FaceDetection) -> Result<i64, StoreError>;
    async fn delete(&self, detection: &StoredFaceDetection) -> Result<(), StoreError>;
}

pub struct SqliteTagStore {
    pool: SqlitePool,
}

impl SqliteTagStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TagStore for SqliteTagStore {
    async fn insert(&self, source: &str, tag: &TagAssignment) -> Result<(), StoreError> {
        storage::tags::assign(&self.pool, tag.file_id, &tag.label, tag.score as f64, source)
            .await?;
        Ok(())
    }
}

pub struct SqliteFaceStore {
    pool: SqlitePool,
}

impl SqliteFaceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// A row whose vector cannot be parsed is still returned, with an empty
/// vector, so it can be deleted like any other.
fn from_row(row: FaceDetectionRow) -> StoredFaceDetection {
    let vector: Vec<f32> = serde_json::from_str(&row.vector).unwrap_or_else(|e| {
        warn!(detection_id = row.id, file_id = row.file_id, error = %e, "unreadable face vector");
        Vec::new()
    });
    StoredFaceDetection {
        id: row.id,
        detection: FaceDetection {
            user_id: row.user_id,
            file_id: row.file_id,
            bbox: BoundingBox {
                x: row.x,
                y: row.y,
                width: row.width,
                height: row.height,
            },
            vector,
        },
    }
}

#[async_trait::async_trait]
impl FaceStore for SqliteFaceStore {
    async fn find_by_file_id(&self, file_id: i64) -> Result<Vec<StoredFaceDetection>, StoreError> {
        Ok(storage::faces::find_by_file_id(&self.pool, file_id)
            .await?
            .into_iter()
            .map(from_row)
            .collect())
    }

    async fn insert(&self, detection: &FaceDetection) -> Result<i64, StoreError> {
        let row = NewFaceDetection {
            user_id: &detection.user_id,
            file_id: detection.file_id,
            x: detection.bbox.x,
            y: detection.bbox.y,
            width: detection.bbox.width,
            height: detection.bbox.height,
            vector: serde_json::to_string(&detection.vector)?,
        };
        Ok(storage::faces::insert(&self.pool, &row).await?)
    }

    async fn delete(&self, detection: &StoredFaceDetection) -> Result<(), StoreError> {
        storage::faces::delete(&self.pool, detection.id).await?;
        Ok(())
    }
}
