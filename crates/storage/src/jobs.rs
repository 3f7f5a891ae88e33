//! Background job list. Jobs are identified by class plus serialized argument.

use sqlx::SqlitePool;

pub async fn has(pool: &SqlitePool, class: &str, argument: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM jobs WHERE class = ?1 AND argument = ?2 LIMIT 1")
            .bind(class)
            .bind(argument)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

pub async fn add(
    pool: &SqlitePool,
    class: &str,
    argument: &str,
    added_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO jobs (class, argument, added_at) VALUES (?1, ?2, ?3)")
        .bind(class)
        .bind(argument)
        .bind(added_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool, class: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE class = ?1")
        .bind(class)
        .fetch_one(pool)
        .await
}

pub async fn list(pool: &SqlitePool, class: &str) -> Result<Vec<crate::models::Job>, sqlx::Error> {
    sqlx::query_as::<_, crate::models::Job>(
        "SELECT id, class, argument, added_at FROM jobs WHERE class = ?1 ORDER BY id",
    )
    .bind(class)
    .fetch_all(pool)
    .await
}
