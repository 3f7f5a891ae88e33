use crate::models::Mount;
use sqlx::SqlitePool;

pub async fn add(
    pool: &SqlitePool,
    user_id: &str,
    root_id: i64,
    mount_point: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO mounts (user_id, root_id, mount_point) VALUES (?1, ?2, ?3)")
        .bind(user_id)
        .bind(root_id)
        .bind(mount_point)
        .execute(pool)
        .await?;
    Ok(())
}

/// Every mount exposing `root_id`; one user may appear through several mounts.
pub async fn for_root(pool: &SqlitePool, root_id: i64) -> Result<Vec<Mount>, sqlx::Error> {
    sqlx::query_as::<_, Mount>(
        "SELECT user_id, root_id, mount_point FROM mounts WHERE root_id = ?1 ORDER BY user_id, mount_point",
    )
    .bind(root_id)
    .fetch_all(pool)
    .await
}
