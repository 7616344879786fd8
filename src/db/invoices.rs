use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::services::{invoice_sync, numbering};
use crate::structs::{Invoice, InvoiceItem};
use crate::utils;

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

#[derive(Deserialize, Debug, Clone)]
pub struct InvoiceInput {
    pub client_id: i64,
    pub supplier_id: i64,
    pub currency_id: i64,
    pub payment_method_id: i64,
    pub status_id: i64,
    pub issued_on: String,
    pub due_on: String,
    pub taxable_supply_on: Option<String>,
    pub variable_symbol: Option<String>,
    pub constant_symbol: Option<String>,
    pub specific_symbol: Option<String>,
    pub message: Option<String>,
    /// JSON array of line items, stored verbatim and mirrored into
    /// `invoice_items` rows on save.
    pub invoice_text: String,
}

impl InvoiceInput {
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [("issued_on", &self.issued_on), ("due_on", &self.due_on)] {
            if !DATE_RE.is_match(value) {
                return Err(AppError::validation(field, "expected YYYY-MM-DD"));
            }
        }
        if let Some(date) = self.taxable_supply_on.as_deref().filter(|s| !s.is_empty()) {
            if !DATE_RE.is_match(date) {
                return Err(AppError::validation("taxable_supply_on", "expected YYYY-MM-DD"));
            }
        }
        for (field, symbol) in [
            ("variable_symbol", &self.variable_symbol),
            ("constant_symbol", &self.constant_symbol),
            ("specific_symbol", &self.specific_symbol),
        ] {
            if let Some(s) = symbol.as_deref().filter(|s| !s.is_empty()) {
                if s.len() > 10 || !s.chars().all(|c| c.is_ascii_digit()) {
                    return Err(AppError::validation(field, "must be up to 10 digits"));
                }
            }
        }
        Ok(())
    }
}

pub async fn list(pool: &SqlitePool, user_id: i64) -> Result<Vec<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        "SELECT * FROM invoices WHERE user_id = $1 ORDER BY issued_on DESC, number DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_items(pool: &SqlitePool, invoice_id: i64) -> Result<Vec<InvoiceItem>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceItem>(
        "SELECT * FROM invoice_items WHERE invoice_id = $1 ORDER BY position",
    )
    .bind(invoice_id)
    .fetch_all(pool)
    .await
}

/// Creates an invoice: parses the line-item blob, assigns the next number in
/// the tenant's yearly sequence and mirrors the pivot rows, all in one
/// transaction.
pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    input: &InvoiceInput,
) -> Result<Invoice, AppError> {
    input.validate()?;
    let items = invoice_sync::parse_line_items(&input.invoice_text)?;
    let total = invoice_sync::invoice_total(&items);
    let now = utils::now_rfc3339();

    let mut tx = pool.begin().await?;
    let number = numbering::next_number(&mut *tx, user_id, &input.issued_on).await?;

    let invoice = sqlx::query_as::<_, Invoice>(
        "INSERT INTO invoices
            (user_id, number, client_id, supplier_id, currency_id, payment_method_id, status_id,
             issued_on, due_on, taxable_supply_on, variable_symbol, constant_symbol,
             specific_symbol, message, invoice_text, total, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
         RETURNING *",
    )
    .bind(user_id)
    .bind(&number)
    .bind(input.client_id)
    .bind(input.supplier_id)
    .bind(input.currency_id)
    .bind(input.payment_method_id)
    .bind(input.status_id)
    .bind(&input.issued_on)
    .bind(&input.due_on)
    .bind(&input.taxable_supply_on)
    .bind(&input.variable_symbol)
    .bind(&input.constant_symbol)
    .bind(&input.specific_symbol)
    .bind(&input.message)
    .bind(&input.invoice_text)
    .bind(total)
    .bind(&now)
    .bind(&now)
    .fetch_one(&mut *tx)
    .await?;

    invoice_sync::replace_items(&mut *tx, invoice.id, &items).await?;
    tx.commit().await?;

    log::info!("Invoice {} created for user {}", invoice.number, user_id);
    Ok(invoice)
}

/// Updates an invoice in place. The number is stable once assigned; the pivot
/// rows are replaced from the new blob in the same transaction.
pub async fn update(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    input: &InvoiceInput,
) -> Result<Invoice, AppError> {
    input.validate()?;
    let items = invoice_sync::parse_line_items(&input.invoice_text)?;
    let total = invoice_sync::invoice_total(&items);
    let now = utils::now_rfc3339();

    let mut tx = pool.begin().await?;
    let invoice = sqlx::query_as::<_, Invoice>(
        "UPDATE invoices SET
            client_id = $1, supplier_id = $2, currency_id = $3, payment_method_id = $4,
            status_id = $5, issued_on = $6, due_on = $7, taxable_supply_on = $8,
            variable_symbol = $9, constant_symbol = $10, specific_symbol = $11,
            message = $12, invoice_text = $13, total = $14, updated_at = $15
         WHERE user_id = $16 AND id = $17 RETURNING *",
    )
    .bind(input.client_id)
    .bind(input.supplier_id)
    .bind(input.currency_id)
    .bind(input.payment_method_id)
    .bind(input.status_id)
    .bind(&input.issued_on)
    .bind(&input.due_on)
    .bind(&input.taxable_supply_on)
    .bind(&input.variable_symbol)
    .bind(&input.constant_symbol)
    .bind(&input.specific_symbol)
    .bind(&input.message)
    .bind(&input.invoice_text)
    .bind(total)
    .bind(&now)
    .bind(user_id)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound)?;

    invoice_sync::replace_items(&mut *tx, invoice.id, &items).await?;
    tx.commit().await?;
    Ok(invoice)
}

pub async fn set_status(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    status_id: i64,
) -> Result<Invoice, AppError> {
    let invoice = sqlx::query_as::<_, Invoice>(
        "UPDATE invoices SET status_id = $1, updated_at = $2
         WHERE user_id = $3 AND id = $4 RETURNING *",
    )
    .bind(status_id)
    .bind(utils::now_rfc3339())
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(invoice)
}

pub async fn delete(pool: &SqlitePool, user_id: i64, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM invoices WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
