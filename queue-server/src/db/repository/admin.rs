//! Admin Repository

use super::{RepoError, RepoResult};
use shared::models::Admin;
use sqlx::SqlitePool;

/// Admin row including the argon2 hash (never serialized)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<AdminRow>> {
    let row = sqlx::query_as::<_, AdminRow>(
        "SELECT id, username, password_hash, created_at FROM admins WHERE username = ? LIMIT 1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<AdminRow>> {
    let row = sqlx::query_as::<_, AdminRow>(
        "SELECT id, username, password_hash, created_at FROM admins WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Insert an admin with an already-hashed password
pub async fn create(pool: &SqlitePool, username: &str, password_hash: &str) -> RepoResult<Admin> {
    let row = sqlx::query_as::<_, AdminRow>(
        "INSERT INTO admins (username, password_hash, created_at) VALUES (?, ?, ?) \
         RETURNING id, username, password_hash, created_at",
    )
    .bind(username)
    .bind(password_hash)
    .bind(shared::util::now_millis())
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!("Admin {username} already exists")),
        other => other,
    })?;
    Ok(row.into())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM admins WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await?;
    Ok(total)
}
