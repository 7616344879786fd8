use serde::Deserialize;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::structs::Product;
use crate::utils;

#[derive(Deserialize, Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    pub currency_id: i64,
    pub tax_id: i64,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name", "must not be empty"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::validation("price", "must be a non-negative number"));
        }
        Ok(())
    }
}

pub async fn list(pool: &SqlitePool, user_id: i64) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE user_id = $1 ORDER BY name")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn find(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    input: &ProductInput,
) -> Result<Product, AppError> {
    input.validate()?;
    let now = utils::now_rfc3339();
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (user_id, name, price, currency_id, tax_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(user_id)
    .bind(&input.name)
    .bind(input.price)
    .bind(input.currency_id)
    .bind(input.tax_id)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;
    Ok(product)
}

pub async fn update(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    input: &ProductInput,
) -> Result<Product, AppError> {
    input.validate()?;
    let now = utils::now_rfc3339();
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $1, price = $2, currency_id = $3, tax_id = $4, updated_at = $5
         WHERE user_id = $6 AND id = $7 RETURNING *",
    )
    .bind(&input.name)
    .bind(input.price)
    .bind(input.currency_id)
    .bind(input.tax_id)
    .bind(&now)
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(product)
}

pub async fn delete(pool: &SqlitePool, user_id: i64, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM products WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
