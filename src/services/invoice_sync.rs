//! Keeps the normalized `invoice_items` rows in sync with the `invoice_text`
//! JSON blob. The blob is the authoritative write; pivot rows are replaced on
//! every save, inside the caller's transaction.

use sqlx::SqliteConnection;

use crate::errors::AppError;
use crate::structs::LineItem;

/// Parses the `invoice_text` blob. Malformed JSON is a validation error, not
/// a server error.
pub fn parse_line_items(invoice_text: &str) -> Result<Vec<LineItem>, AppError> {
    serde_json::from_str(invoice_text)
        .map_err(|e| AppError::validation("invoice_text", &format!("malformed line items: {}", e)))
}

pub fn line_total(item: &LineItem) -> f64 {
    item.price * item.quantity * (1.0 + item.tax_rate / 100.0)
}

pub fn invoice_total(items: &[LineItem]) -> f64 {
    items.iter().map(line_total).sum()
}

/// Replaces the pivot rows for an invoice with fresh ones derived from the
/// parsed blob.
pub async fn replace_items(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    items: &[LineItem],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
        .bind(invoice_id)
        .execute(&mut *conn)
        .await?;

    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO invoice_items (invoice_id, position, name, quantity, unit, price, tax_rate)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(invoice_id)
        .bind(position as i64 + 1)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.price)
        .bind(item.tax_rate)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: f64, tax_rate: f64) -> LineItem {
        LineItem {
            name: "work".to_string(),
            quantity,
            unit: Some("h".to_string()),
            price,
            tax_rate,
        }
    }

    #[test]
    fn parses_valid_blob() {
        let items = parse_line_items(
            r#"[{"name":"Consulting","quantity":2,"unit":"h","price":1500.0,"tax_rate":21}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Consulting");
        assert_eq!(items[0].tax_rate, 21.0);
    }

    #[test]
    fn malformed_blob_is_validation_error() {
        let err = parse_line_items("{not json").unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn empty_array_is_fine() {
        assert!(parse_line_items("[]").unwrap().is_empty());
    }

    #[test]
    fn totals_include_tax() {
        let items = vec![item(100.0, 2.0, 21.0), item(50.0, 1.0, 0.0)];
        let total = invoice_total(&items);
        assert!((total - (242.0 + 50.0)).abs() < 1e-9);
    }
}
