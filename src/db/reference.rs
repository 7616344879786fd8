use serde::Deserialize;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::structs::{Bank, Country, Currency, PaymentMethod, Status, Tax};
use crate::validators;

pub async fn list_countries(pool: &SqlitePool) -> Result<Vec<Country>, sqlx::Error> {
    sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn list_currencies(pool: &SqlitePool) -> Result<Vec<Currency>, sqlx::Error> {
    sqlx::query_as::<_, Currency>("SELECT * FROM currencies ORDER BY code")
        .fetch_all(pool)
        .await
}

pub async fn find_currency(pool: &SqlitePool, id: i64) -> Result<Option<Currency>, sqlx::Error> {
    sqlx::query_as::<_, Currency>("SELECT * FROM currencies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_banks(pool: &SqlitePool) -> Result<Vec<Bank>, sqlx::Error> {
    sqlx::query_as::<_, Bank>("SELECT * FROM banks ORDER BY code")
        .fetch_all(pool)
        .await
}

pub async fn list_taxes(pool: &SqlitePool) -> Result<Vec<Tax>, sqlx::Error> {
    sqlx::query_as::<_, Tax>("SELECT * FROM taxes ORDER BY rate DESC")
        .fetch_all(pool)
        .await
}

pub async fn list_payment_methods(pool: &SqlitePool) -> Result<Vec<PaymentMethod>, sqlx::Error> {
    sqlx::query_as::<_, PaymentMethod>("SELECT * FROM payment_methods ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn list_statuses(pool: &SqlitePool) -> Result<Vec<Status>, sqlx::Error> {
    sqlx::query_as::<_, Status>("SELECT * FROM statuses ORDER BY id")
        .fetch_all(pool)
        .await
}

#[derive(Deserialize, Debug, Clone)]
pub struct TaxInput {
    pub name: String,
    pub rate: f64,
}

pub async fn create_tax(pool: &SqlitePool, input: &TaxInput) -> Result<Tax, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("name", "must not be empty"));
    }
    if !input.rate.is_finite() || input.rate < 0.0 || input.rate > 100.0 {
        return Err(AppError::validation("rate", "must be between 0 and 100"));
    }
    let tax = sqlx::query_as::<_, Tax>("INSERT INTO taxes (name, rate) VALUES ($1, $2) RETURNING *")
        .bind(&input.name)
        .bind(input.rate)
        .fetch_one(pool)
        .await?;
    Ok(tax)
}

pub async fn delete_tax(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM taxes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

#[derive(Deserialize, Debug, Clone)]
pub struct BankInput {
    pub code: String,
    pub name: String,
    pub swift: Option<String>,
}

pub async fn create_bank(pool: &SqlitePool, input: &BankInput) -> Result<Bank, AppError> {
    if input.code.len() != 4 || !input.code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("code", "bank code must be 4 digits"));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::validation("name", "must not be empty"));
    }
    if let Some(swift) = input.swift.as_deref().filter(|s| !s.is_empty()) {
        validators::validate_swift(swift)?;
    }
    let bank = sqlx::query_as::<_, Bank>(
        "INSERT INTO banks (code, name, swift) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&input.code)
    .bind(&input.name)
    .bind(&input.swift)
    .fetch_one(pool)
    .await?;
    Ok(bank)
}

pub async fn delete_bank(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM banks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
