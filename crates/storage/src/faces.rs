use crate::models::{FaceDetectionRow, NewFaceDetection};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, user_id, file_id, x, y, width, height, vector, cluster_id";

/// All detections of a file, across users.
pub async fn find_by_file_id(
    pool: &SqlitePool,
    file_id: i64,
) -> Result<Vec<FaceDetectionRow>, sqlx::Error> {
    sqlx::query_as::<_, FaceDetectionRow>(&format!(
        "SELECT {COLUMNS} FROM face_detections WHERE file_id = ?1 ORDER BY id"
    ))
    .bind(file_id)
    .fetch_all(pool)
    .await
}

pub async fn insert(pool: &SqlitePool, face: &NewFaceDetection<'_>) -> Result<i64, sqlx::Error> {
    let res = sqlx::query(
        r#"
        INSERT INTO face_detections (user_id, file_id, x, y, width, height, vector)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(face.user_id)
    .bind(face.file_id)
    .bind(face.x)
    .bind(face.y)
    .bind(face.width)
    .bind(face.height)
    .bind(face.vector.as_str())
    .execute(pool)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM face_detections WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
