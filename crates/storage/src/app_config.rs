use sqlx::SqlitePool;

pub async fn get(pool: &SqlitePool, namespace: &str, key: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT value FROM app_config WHERE namespace = ?1 AND key = ?2")
        .bind(namespace)
        .bind(key)
        .fetch_optional(pool)
        .await
}

pub async fn set(pool: &SqlitePool, namespace: &str, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO app_config (namespace, key, value) VALUES (?1, ?2, ?3)
        ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(namespace)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list(pool: &SqlitePool, namespace: &str) -> Result<Vec<(String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String)>(
        "SELECT key, value FROM app_config WHERE namespace = ?1 ORDER BY key",
    )
    .bind(namespace)
    .fetch_all(pool)
    .await
}
