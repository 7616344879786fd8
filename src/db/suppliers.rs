use serde::Deserialize;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::structs::Supplier;
use crate::utils;
use crate::validators;

#[derive(Deserialize, Debug, Clone)]
pub struct SupplierInput {
    pub name: String,
    pub ico: Option<String>,
    pub dic: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country_id: Option<i64>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub account_number: Option<String>,
    pub iban: Option<String>,
    pub swift: Option<String>,
    pub bank_id: Option<i64>,
}

impl SupplierInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name", "must not be empty"));
        }
        if let Some(ico) = self.ico.as_deref().filter(|s| !s.is_empty()) {
            validators::validate_ico(ico)?;
        }
        if let Some(dic) = self.dic.as_deref().filter(|s| !s.is_empty()) {
            validators::validate_dic(dic)?;
        }
        if let Some(iban) = self.iban.as_deref().filter(|s| !s.is_empty()) {
            validators::validate_iban(iban)?;
        }
        if let Some(swift) = self.swift.as_deref().filter(|s| !s.is_empty()) {
            validators::validate_swift(swift)?;
        }
        Ok(())
    }
}

pub async fn list(pool: &SqlitePool, user_id: i64) -> Result<Vec<Supplier>, sqlx::Error> {
    sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE user_id = $1 ORDER BY name")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn find(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<Option<Supplier>, sqlx::Error> {
    sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    input: &SupplierInput,
) -> Result<Supplier, AppError> {
    input.validate()?;
    let now = utils::now_rfc3339();
    let supplier = sqlx::query_as::<_, Supplier>(
        "INSERT INTO suppliers
            (user_id, name, ico, dic, street, city, zip, country_id, email, phone,
             account_number, iban, swift, bank_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
         RETURNING *",
    )
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.ico)
    .bind(&input.dic)
    .bind(&input.street)
    .bind(&input.city)
    .bind(&input.zip)
    .bind(input.country_id)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.account_number)
    .bind(&input.iban)
    .bind(&input.swift)
    .bind(input.bank_id)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;
    Ok(supplier)
}

pub async fn update(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    input: &SupplierInput,
) -> Result<Supplier, AppError> {
    input.validate()?;
    let now = utils::now_rfc3339();
    let supplier = sqlx::query_as::<_, Supplier>(
        "UPDATE suppliers SET
            name = $1, ico = $2, dic = $3, street = $4, city = $5, zip = $6,
            country_id = $7, email = $8, phone = $9, account_number = $10,
            iban = $11, swift = $12, bank_id = $13, updated_at = $14
         WHERE user_id = $15 AND id = $16 RETURNING *",
    )
    .bind(&input.name)
    .bind(&input.ico)
    .bind(&input.dic)
    .bind(&input.street)
    .bind(&input.city)
    .bind(&input.zip)
    .bind(input.country_id)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.account_number)
    .bind(&input.iban)
    .bind(&input.swift)
    .bind(input.bank_id)
    .bind(&now)
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(supplier)
}

pub async fn delete(pool: &SqlitePool, user_id: i64, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM suppliers WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
