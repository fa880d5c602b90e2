//! Visitor Repository

use super::RepoResult;
use shared::models::VisitorHit;
use sqlx::SqlitePool;

pub async fn insert(pool: &SqlitePool, path: &str, timestamp: i64) -> RepoResult<VisitorHit> {
    let hit = sqlx::query_as::<_, VisitorHit>(
        "INSERT INTO visitors (path, timestamp) VALUES (?, ?) RETURNING id, path, timestamp",
    )
    .bind(path)
    .bind(timestamp)
    .fetch_one(pool)
    .await?;
    Ok(hit)
}

/// Count hits at or after `since` (all time when `None`), optionally for one path
pub async fn count_since(
    pool: &SqlitePool,
    since: Option<i64>,
    path: Option<&str>,
) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM visitors WHERE (?1 IS NULL OR timestamp >= ?1) AND (?2 IS NULL OR path = ?2)",
    )
    .bind(since)
    .bind(path)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Hits at or after `since`, oldest first
pub async fn find_since(pool: &SqlitePool, since: Option<i64>) -> RepoResult<Vec<VisitorHit>> {
    let hits = sqlx::query_as::<_, VisitorHit>(
        "SELECT id, path, timestamp FROM visitors WHERE (?1 IS NULL OR timestamp >= ?1) ORDER BY timestamp ASC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(hits)
}
