use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct ApiToken {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Client {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub ico: Option<String>,
    pub dic: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country_id: Option<i64>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Supplier {
    pub id: i64,
    pub user_id: i64,
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
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub price: f64,
    pub currency_id: i64,
    pub tax_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub user_id: i64,
    pub number: String,
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
    pub invoice_text: String,
    pub total: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Normalized line-item row, kept in sync with the `invoice_text` JSON blob.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub position: i64,
    pub name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub price: f64,
    pub tax_rate: f64,
}

/// Wire shape of one entry inside `invoice_text`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub tax_rate: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Tax {
    pub id: i64,
    pub name: String,
    pub rate: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Bank {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub swift: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Status {
    pub id: i64,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Country {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub symbol: String,
}
