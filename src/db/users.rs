use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::structs::User;
use crate::utils;

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<User, AppError> {
    let now = utils::now_rfc3339();
    let pwd_hash = utils::hash_password(password)?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, pwd_hash, role, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(pwd_hash)
    .bind(role)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;
    log::info!("User created: {} ({})", user.email, user.id);
    Ok(user)
}

pub async fn update_password(
    pool: &SqlitePool,
    id: i64,
    password: &str,
) -> Result<User, AppError> {
    let now = utils::now_rfc3339();
    let pwd_hash = utils::hash_password(password)?;
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET updated_at = $1, pwd_hash = $2 WHERE id = $3 RETURNING *",
    )
    .bind(&now)
    .bind(pwd_hash)
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    log::info!("User with id {} deleted", id);
    Ok(())
}
