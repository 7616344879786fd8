//! Invoice numbers: `{year}{seq:04}`, a per-tenant sequence that restarts
//! every year. The COUNT and the subsequent insert run inside one transaction,
//! so SQLite's writer lock keeps the sequence gap-free.

use sqlx::SqliteConnection;

pub fn format_number(year: i32, seq: i64) -> String {
    format!("{}{:04}", year, seq)
}

/// Year component of an `YYYY-MM-DD` date string; falls back to the current
/// year when the date is malformed (the input validator rejects those before
/// this point is ever reached).
pub fn year_of(date: &str) -> i32 {
    date.get(..4)
        .and_then(|y| y.parse().ok())
        .unwrap_or_else(|| chrono::Utc::now().format("%Y").to_string().parse().unwrap_or(1970))
}

pub async fn next_number(
    conn: &mut SqliteConnection,
    user_id: i64,
    issued_on: &str,
) -> Result<String, sqlx::Error> {
    let year = year_of(issued_on);
    let prefix = format!("{}%", year);
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM invoices WHERE user_id = $1 AND number LIKE $2")
            .bind(user_id)
            .bind(&prefix)
            .fetch_one(conn)
            .await?;
    Ok(format_number(year, count.0 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded() {
        assert_eq!(format_number(2026, 1), "20260001");
        assert_eq!(format_number(2026, 42), "20260042");
        assert_eq!(format_number(2026, 12345), "202612345");
    }

    #[test]
    fn year_extraction() {
        assert_eq!(year_of("2026-08-30"), 2026);
        assert_eq!(year_of("1999-01-01"), 1999);
    }
}
