use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::structs::{ApiToken, User};
use crate::utils;

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    name: &str,
    token_hash: &str,
) -> Result<ApiToken, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "must not be empty"));
    }
    let token = sqlx::query_as::<_, ApiToken>(
        "INSERT INTO api_tokens (user_id, name, token_hash, created_at)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(name)
    .bind(token_hash)
    .bind(utils::now_rfc3339())
    .fetch_one(pool)
    .await?;
    log::info!("API token '{}' issued for user {}", token.name, user_id);
    Ok(token)
}

pub async fn list(pool: &SqlitePool, user_id: i64) -> Result<Vec<ApiToken>, sqlx::Error> {
    sqlx::query_as::<_, ApiToken>("SELECT * FROM api_tokens WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Resolves the owner of a token by its hash. A deleted token simply stops
/// resolving, which is what revocation means here.
pub async fn find_user_by_hash(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u
         JOIN api_tokens t ON t.user_id = u.id
         WHERE t.token_hash = $1",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, user_id: i64, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM api_tokens WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
