//! Behavioral tests over the repository layer: tenant scoping, the invoice
//! numbering/sync pipeline, token auth and permission lookups — all against
//! an in-memory SQLite database with the real migrations applied.

use chrono::{Datelike, Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use fakturo::db;
use fakturo::errors::AppError;
use fakturo::stats;
use fakturo::structs::User;
use fakturo::{auth, utils, MIGRATOR};

async fn test_pool() -> SqlitePool {
    // One connection that never retires, otherwise the :memory: database
    // would vanish between acquires.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    MIGRATOR.run(&pool).await.expect("migrations");
    pool
}

async fn test_user(pool: &SqlitePool, email: &str) -> User {
    db::users::create(pool, "Test User", email, "a-long-enough-password", auth::ROLE_USER)
        .await
        .expect("user")
}

fn client_input(name: &str) -> db::clients::ClientInput {
    serde_json::from_value(serde_json::json!({ "name": name })).unwrap()
}

fn supplier_input(name: &str, iban: Option<&str>) -> db::suppliers::SupplierInput {
    serde_json::from_value(serde_json::json!({ "name": name, "iban": iban })).unwrap()
}

async fn invoice_fixture(
    pool: &SqlitePool,
    user: &User,
    issued_on: &str,
    invoice_text: &str,
) -> Result<fakturo::structs::Invoice, AppError> {
    let client = db::clients::create(pool, user.id, &client_input("Client A")).await?;
    let supplier =
        db::suppliers::create(pool, user.id, &supplier_input("Supplier A", None)).await?;
    let input: db::invoices::InvoiceInput = serde_json::from_value(serde_json::json!({
        "client_id": client.id,
        "supplier_id": supplier.id,
        "currency_id": 1,
        "payment_method_id": 1,
        "status_id": 1,
        "issued_on": issued_on,
        "due_on": "2026-02-10",
        "invoice_text": invoice_text,
    }))
    .unwrap();
    db::invoices::create(pool, user.id, &input).await
}

#[tokio::test]
async fn clients_are_scoped_by_tenant() {
    let pool = test_pool().await;
    let alice = test_user(&pool, "alice@example.com").await;
    let bob = test_user(&pool, "bob@example.com").await;

    db::clients::create(&pool, alice.id, &client_input("Alice's client"))
        .await
        .unwrap();
    let bobs_client = db::clients::create(&pool, bob.id, &client_input("Bob's client"))
        .await
        .unwrap();

    let alice_list = db::clients::list(&pool, alice.id).await.unwrap();
    assert_eq!(alice_list.len(), 1);
    assert_eq!(alice_list[0].name, "Alice's client");

    // Cross-tenant reads and deletes miss.
    assert!(db::clients::find(&pool, alice.id, bobs_client.id)
        .await
        .unwrap()
        .is_none());
    assert!(matches!(
        db::clients::delete(&pool, alice.id, bobs_client.id).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn client_validation_rejects_bad_ico() {
    let pool = test_pool().await;
    let user = test_user(&pool, "a@example.com").await;

    let mut input = client_input("Broken");
    input.ico = Some("25596642".to_string());
    let err = db::clients::create(&pool, user.id, &input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn supplier_validation_rejects_bad_iban() {
    let pool = test_pool().await;
    let user = test_user(&pool, "a@example.com").await;

    let err = db::suppliers::create(
        &pool,
        user.id,
        &supplier_input("Broken", Some("CZ6508000000192000145398")),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn invoice_numbers_follow_yearly_sequence_per_tenant() {
    let pool = test_pool().await;
    let alice = test_user(&pool, "alice@example.com").await;
    let bob = test_user(&pool, "bob@example.com").await;

    let first = invoice_fixture(&pool, &alice, "2026-01-10", "[]").await.unwrap();
    let second = invoice_fixture(&pool, &alice, "2026-03-01", "[]").await.unwrap();
    let other_year = invoice_fixture(&pool, &alice, "2027-01-05", "[]").await.unwrap();
    let bobs = invoice_fixture(&pool, &bob, "2026-01-10", "[]").await.unwrap();

    assert_eq!(first.number, "20260001");
    assert_eq!(second.number, "20260002");
    assert_eq!(other_year.number, "20270001");
    // Bob's sequence is independent of Alice's.
    assert_eq!(bobs.number, "20260001");
}

#[tokio::test]
async fn invoice_save_syncs_pivot_rows_and_total() {
    let pool = test_pool().await;
    let user = test_user(&pool, "a@example.com").await;

    let text = r#"[
        {"name": "Consulting", "quantity": 2, "unit": "h", "price": 1000.0, "tax_rate": 21},
        {"name": "Hosting", "quantity": 1, "price": 500.0, "tax_rate": 0}
    ]"#;
    let invoice = invoice_fixture(&pool, &user, "2026-01-10", text).await.unwrap();

    let items = db::invoices::list_items(&pool, invoice.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].position, 1);
    assert_eq!(items[0].name, "Consulting");
    assert_eq!(items[1].name, "Hosting");
    // 2 * 1000 * 1.21 + 500
    assert!((invoice.total - 2920.0).abs() < 1e-9);

    // An update replaces the pivot rows from the new blob.
    let input: db::invoices::InvoiceInput = serde_json::from_value(serde_json::json!({
        "client_id": invoice.client_id,
        "supplier_id": invoice.supplier_id,
        "currency_id": invoice.currency_id,
        "payment_method_id": invoice.payment_method_id,
        "status_id": invoice.status_id,
        "issued_on": invoice.issued_on,
        "due_on": invoice.due_on,
        "invoice_text": r#"[{"name": "Support", "quantity": 1, "price": 100.0, "tax_rate": 0}]"#,
    }))
    .unwrap();
    let updated = db::invoices::update(&pool, user.id, invoice.id, &input).await.unwrap();
    assert_eq!(updated.number, invoice.number);
    assert!((updated.total - 100.0).abs() < 1e-9);

    let items = db::invoices::list_items(&pool, invoice.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Support");
}

#[tokio::test]
async fn malformed_invoice_text_is_a_validation_error() {
    let pool = test_pool().await;
    let user = test_user(&pool, "a@example.com").await;

    let err = invoice_fixture(&pool, &user, "2026-01-10", "{broken").await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn bad_dates_and_symbols_are_rejected() {
    let pool = test_pool().await;
    let user = test_user(&pool, "a@example.com").await;
    let client = db::clients::create(&pool, user.id, &client_input("C")).await.unwrap();
    let supplier = db::suppliers::create(&pool, user.id, &supplier_input("S", None))
        .await
        .unwrap();

    let base = serde_json::json!({
        "client_id": client.id,
        "supplier_id": supplier.id,
        "currency_id": 1,
        "payment_method_id": 1,
        "status_id": 1,
        "issued_on": "2026-01-10",
        "due_on": "2026-02-10",
        "invoice_text": "[]",
    });

    let mut bad_date = base.clone();
    bad_date["issued_on"] = serde_json::json!("10.1.2026");
    let input: db::invoices::InvoiceInput = serde_json::from_value(bad_date).unwrap();
    assert!(matches!(
        db::invoices::create(&pool, user.id, &input).await,
        Err(AppError::Validation { .. })
    ));

    let mut bad_symbol = base.clone();
    bad_symbol["variable_symbol"] = serde_json::json!("abc123");
    let input: db::invoices::InvoiceInput = serde_json::from_value(bad_symbol).unwrap();
    assert!(matches!(
        db::invoices::create(&pool, user.id, &input).await,
        Err(AppError::Validation { .. })
    ));
}

#[tokio::test]
async fn api_tokens_resolve_until_revoked() {
    let pool = test_pool().await;
    let user = test_user(&pool, "a@example.com").await;

    let plaintext = auth::generate_token();
    let token = db::tokens::create(&pool, user.id, "ci", &auth::token_hash(&plaintext))
        .await
        .unwrap();

    let resolved = db::tokens::find_user_by_hash(&pool, &auth::token_hash(&plaintext))
        .await
        .unwrap()
        .expect("token resolves");
    assert_eq!(resolved.id, user.id);

    // An unknown token resolves to nobody.
    assert!(db::tokens::find_user_by_hash(&pool, &auth::token_hash("nope"))
        .await
        .unwrap()
        .is_none());

    db::tokens::delete(&pool, user.id, token.id).await.unwrap();
    assert!(db::tokens::find_user_by_hash(&pool, &auth::token_hash(&plaintext))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn role_permissions_come_from_seed() {
    let pool = test_pool().await;

    assert!(db::permissions::role_has_permission(&pool, "admin", "manage_users")
        .await
        .unwrap());
    assert!(!db::permissions::role_has_permission(&pool, "user", "manage_users")
        .await
        .unwrap());
    // Unknown role has no permissions at all.
    assert!(!db::permissions::role_has_permission(&pool, "ghost", "manage_users")
        .await
        .unwrap());
    assert!(db::permissions::permissions_for_role(&pool, "ghost")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn stats_bucket_by_month_status_and_currency() {
    let pool = test_pool().await;
    let user = test_user(&pool, "a@example.com").await;

    let today = Utc::now().date_naive();
    let current = today.with_day(10).unwrap();
    // Last day of the previous month, then two dates inside it.
    let previous = today.with_day(1).unwrap() - Duration::days(1);
    let ancient = today - Duration::days(700);
    let fmt = |d: chrono::NaiveDate| d.format("%Y-%m-%d").to_string();

    let text = r#"[{"name": "Work", "quantity": 1, "price": 100.0, "tax_rate": 0}]"#;
    invoice_fixture(&pool, &user, &fmt(current), text).await.unwrap();
    invoice_fixture(&pool, &user, &fmt(previous.with_day(3).unwrap()), text)
        .await
        .unwrap();
    invoice_fixture(&pool, &user, &fmt(previous.with_day(20).unwrap()), text)
        .await
        .unwrap();
    invoice_fixture(&pool, &user, &fmt(ancient), text).await.unwrap();

    let overview = stats::overview(&pool, user.id).await.unwrap();
    assert_eq!(overview.invoices, 4);

    // The month buckets cover the trailing year only.
    let months = stats::revenue_by_month(&pool, user.id).await.unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months[0].month, current.format("%Y-%m").to_string());
    assert_eq!(months[0].count, 1);
    assert_eq!(months[1].month, previous.format("%Y-%m").to_string());
    assert_eq!(months[1].count, 2);
    assert!((months[1].total - 200.0).abs() < 1e-9);

    let by_status = stats::invoices_by_status(&pool, user.id).await.unwrap();
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].status, "draft");
    assert_eq!(by_status[0].count, 4);

    let by_currency = stats::revenue_by_currency(&pool, user.id).await.unwrap();
    assert_eq!(by_currency.len(), 1);
    assert_eq!(by_currency[0].currency, "CZK");

    // A second tenant sees an empty dashboard.
    let other = test_user(&pool, "b@example.com").await;
    let overview = stats::overview(&pool, other.id).await.unwrap();
    assert_eq!(overview.invoices, 0);
}

#[tokio::test]
async fn password_change_rotates_the_hash() {
    let pool = test_pool().await;
    let user = test_user(&pool, "a@example.com").await;
    assert!(utils::verify_password("a-long-enough-password", &user.pwd_hash));

    let updated = db::users::update_password(&pool, user.id, "a-brand-new-password")
        .await
        .unwrap();
    assert!(utils::verify_password("a-brand-new-password", &updated.pwd_hash));
    assert!(!utils::verify_password("a-long-enough-password", &updated.pwd_hash));
}
