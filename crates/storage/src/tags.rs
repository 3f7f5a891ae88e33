use crate::models::FileTag;
use sqlx::SqlitePool;

/// Attaches `name` to a file. Earlier assignments of the same tag are kept.
pub async fn assign(
    pool: &SqlitePool,
    file_id: i64,
    name: &str,
    confidence: f64,
    source: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?1)")
        .bind(name)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO file_tags (file_id, tag_id, confidence, source)
        VALUES (?1, (SELECT id FROM tags WHERE name = ?2), ?3, ?4)
        "#,
    )
    .bind(file_id)
    .bind(name)
    .bind(confidence)
    .bind(source)
    .execute(&mut *tx)
    .await?;
    tx.commit().await
}

pub async fn for_file(pool: &SqlitePool, file_id: i64) -> Result<Vec<FileTag>, sqlx::Error> {
    sqlx::query_as::<_, FileTag>(
        r#"
        SELECT ft.file_id, t.name, ft.confidence, ft.source
        FROM file_tags ft JOIN tags t ON t.id = ft.tag_id
        WHERE ft.file_id = ?1
        ORDER BY ft.id
        "#,
    )
    .bind(file_id)
    .fetch_all(pool)
    .await
}
