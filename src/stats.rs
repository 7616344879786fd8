//! Dashboard statistics: per-tenant SQL aggregates.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

#[derive(Serialize, Debug, Clone, FromRow)]
pub struct Overview {
    pub clients: i64,
    pub suppliers: i64,
    pub products: i64,
    pub invoices: i64,
}

#[derive(Serialize, Debug, Clone, FromRow)]
pub struct MonthRevenue {
    pub month: String,
    pub total: f64,
    pub count: i64,
}

#[derive(Serialize, Debug, Clone, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Serialize, Debug, Clone, FromRow)]
pub struct CurrencyRevenue {
    pub currency: String,
    pub total: f64,
}

#[derive(Serialize, Debug, Clone)]
pub struct Dashboard {
    pub overview: Overview,
    pub revenue_by_month: Vec<MonthRevenue>,
    pub invoices_by_status: Vec<StatusCount>,
    pub revenue_by_currency: Vec<CurrencyRevenue>,
}

pub async fn overview(pool: &SqlitePool, user_id: i64) -> Result<Overview, sqlx::Error> {
    sqlx::query_as::<_, Overview>(
        "SELECT
            (SELECT COUNT(*) FROM clients WHERE user_id = $1) AS clients,
            (SELECT COUNT(*) FROM suppliers WHERE user_id = $1) AS suppliers,
            (SELECT COUNT(*) FROM products WHERE user_id = $1) AS products,
            (SELECT COUNT(*) FROM invoices WHERE user_id = $1) AS invoices",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Invoiced amount per calendar month over the trailing twelve months,
/// newest first. Older invoices stay out even when recent months are sparse.
pub async fn revenue_by_month(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<MonthRevenue>, sqlx::Error> {
    sqlx::query_as::<_, MonthRevenue>(
        "SELECT strftime('%Y-%m', issued_on) AS month,
                SUM(total) AS total,
                COUNT(*) AS count
         FROM invoices
         WHERE user_id = $1
           AND issued_on >= date('now', '-12 months')
         GROUP BY month
         ORDER BY month DESC
         LIMIT 12",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn invoices_by_status(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(
        "SELECT s.name AS status, COUNT(i.id) AS count
         FROM invoices i
         JOIN statuses s ON s.id = i.status_id
         WHERE i.user_id = $1
         GROUP BY s.name
         ORDER BY count DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn revenue_by_currency(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<CurrencyRevenue>, sqlx::Error> {
    sqlx::query_as::<_, CurrencyRevenue>(
        "SELECT c.code AS currency, SUM(i.total) AS total
         FROM invoices i
         JOIN currencies c ON c.id = i.currency_id
         WHERE i.user_id = $1
         GROUP BY c.code
         ORDER BY total DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn dashboard(pool: &SqlitePool, user_id: i64) -> Result<Dashboard, sqlx::Error> {
    Ok(Dashboard {
        overview: overview(pool, user_id).await?,
        revenue_by_month: revenue_by_month(pool, user_id).await?,
        invoices_by_status: invoices_by_status(pool, user_id).await?,
        revenue_by_currency: revenue_by_currency(pool, user_id).await?,
    })
}
