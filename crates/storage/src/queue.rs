//! Files waiting to be classified, one entry per (model, file).

use crate::models::QueueEntry;
use sqlx::SqlitePool;

/// Returns true if a new entry was added.
pub async fn push(
    pool: &SqlitePool,
    model: &str,
    file_id: i64,
    root_id: i64,
    path: &str,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        "INSERT OR IGNORE INTO queue (model, file_id, root_id, path) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(model)
    .bind(file_id)
    .bind(root_id)
    .bind(path)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// Oldest entries first.
pub async fn take(pool: &SqlitePool, model: &str, limit: i64) -> Result<Vec<QueueEntry>, sqlx::Error> {
    sqlx::query_as::<_, QueueEntry>(
        "SELECT id, model, file_id, root_id, path FROM queue WHERE model = ?1 ORDER BY id LIMIT ?2",
    )
    .bind(model)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn remove(pool: &SqlitePool, ids: &[i64]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = std::iter::repeat("?")
        .take(ids.len())
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!("DELETE FROM queue WHERE id IN ({})", placeholders);
    let mut q = sqlx::query(&sql);
    for id in ids {
        q = q.bind(id);
    }
    Ok(q.execute(pool).await?.rows_affected())
}

pub async fn count(pool: &SqlitePool, model: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM queue WHERE model = ?1")
        .bind(model)
        .fetch_one(pool)
        .await
}
