use sqlx::SqlitePool;

/// Registers `path` under `root_id`, returning the file id.
pub async fn upsert(pool: &SqlitePool, path: &str, root_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO files (path, root_id) VALUES (?1, ?2)
        ON CONFLICT(path) DO UPDATE SET root_id = excluded.root_id
        "#,
    )
    .bind(path)
    .bind(root_id)
    .execute(pool)
    .await?;
    sqlx::query_scalar("SELECT id FROM files WHERE path = ?1")
        .bind(path)
        .fetch_one(pool)
        .await
}

