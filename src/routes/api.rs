//! JSON API under `/api`. Every endpoint sits behind the dual-guard check:
//! admin session, frontend session or bearer token, in that order.

use actix_identity::Identity;
use actix_web::{
    delete, get, post, put,
    web::{self, Data},
    HttpRequest, HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, Guard};
use crate::db;
use crate::errors::AppError;
use crate::services::{pdf, qr_payment};
use crate::stats;
use crate::AppState;

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

#[get("/api/clients")]
pub async fn list_clients(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let clients = db::clients::list(&state.db_pool, auth.user.id).await?;
    Ok(HttpResponse::Ok().json(clients))
}

#[post("/api/clients")]
pub async fn create_client(
    state: Data<AppState>,
    input: web::Json<db::clients::ClientInput>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let client = db::clients::create(&state.db_pool, auth.user.id, &input).await?;
    Ok(HttpResponse::Created().json(client))
}

#[get("/api/clients/{id}")]
pub async fn get_client(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let client = db::clients::find(&state.db_pool, auth.user.id, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(client))
}

#[put("/api/clients/{id}")]
pub async fn update_client(
    state: Data<AppState>,
    path: web::Path<i64>,
    input: web::Json<db::clients::ClientInput>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let client = db::clients::update(&state.db_pool, auth.user.id, path.into_inner(), &input).await?;
    Ok(HttpResponse::Ok().json(client))
}

#[delete("/api/clients/{id}")]
pub async fn delete_client(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    db::clients::delete(&state.db_pool, auth.user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

#[get("/api/suppliers")]
pub async fn list_suppliers(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let suppliers = db::suppliers::list(&state.db_pool, auth.user.id).await?;
    Ok(HttpResponse::Ok().json(suppliers))
}

#[post("/api/suppliers")]
pub async fn create_supplier(
    state: Data<AppState>,
    input: web::Json<db::suppliers::SupplierInput>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let supplier = db::suppliers::create(&state.db_pool, auth.user.id, &input).await?;
    Ok(HttpResponse::Created().json(supplier))
}

#[get("/api/suppliers/{id}")]
pub async fn get_supplier(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let supplier = db::suppliers::find(&state.db_pool, auth.user.id, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(supplier))
}

#[put("/api/suppliers/{id}")]
pub async fn update_supplier(
    state: Data<AppState>,
    path: web::Path<i64>,
    input: web::Json<db::suppliers::SupplierInput>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let supplier =
        db::suppliers::update(&state.db_pool, auth.user.id, path.into_inner(), &input).await?;
    Ok(HttpResponse::Ok().json(supplier))
}

#[delete("/api/suppliers/{id}")]
pub async fn delete_supplier(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    db::suppliers::delete(&state.db_pool, auth.user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[get("/api/products")]
pub async fn list_products(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let products = db::products::list(&state.db_pool, auth.user.id).await?;
    Ok(HttpResponse::Ok().json(products))
}

#[post("/api/products")]
pub async fn create_product(
    state: Data<AppState>,
    input: web::Json<db::products::ProductInput>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let product = db::products::create(&state.db_pool, auth.user.id, &input).await?;
    Ok(HttpResponse::Created().json(product))
}

#[put("/api/products/{id}")]
pub async fn update_product(
    state: Data<AppState>,
    path: web::Path<i64>,
    input: web::Json<db::products::ProductInput>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let product =
        db::products::update(&state.db_pool, auth.user.id, path.into_inner(), &input).await?;
    Ok(HttpResponse::Ok().json(product))
}

#[delete("/api/products/{id}")]
pub async fn delete_product(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    db::products::delete(&state.db_pool, auth.user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[get("/api/invoices")]
pub async fn list_invoices(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let invoices = db::invoices::list(&state.db_pool, auth.user.id).await?;
    Ok(HttpResponse::Ok().json(invoices))
}

#[post("/api/invoices")]
pub async fn create_invoice(
    state: Data<AppState>,
    input: web::Json<db::invoices::InvoiceInput>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let invoice = db::invoices::create(&state.db_pool, auth.user.id, &input).await?;
    Ok(HttpResponse::Created().json(invoice))
}

#[get("/api/invoices/{id}")]
pub async fn get_invoice(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let invoice = db::invoices::find(&state.db_pool, auth.user.id, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let items = db::invoices::list_items(&state.db_pool, invoice.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "invoice": invoice, "items": items })))
}

#[put("/api/invoices/{id}")]
pub async fn update_invoice(
    state: Data<AppState>,
    path: web::Path<i64>,
    input: web::Json<db::invoices::InvoiceInput>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let invoice =
        db::invoices::update(&state.db_pool, auth.user.id, path.into_inner(), &input).await?;
    Ok(HttpResponse::Ok().json(invoice))
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status_id: i64,
}

#[post("/api/invoices/{id}/status")]
pub async fn set_invoice_status(
    state: Data<AppState>,
    path: web::Path<i64>,
    input: web::Json<StatusChange>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let invoice =
        db::invoices::set_status(&state.db_pool, auth.user.id, path.into_inner(), input.status_id)
            .await?;
    Ok(HttpResponse::Ok().json(invoice))
}

#[delete("/api/invoices/{id}")]
pub async fn delete_invoice(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    db::invoices::delete(&state.db_pool, auth.user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Payment QR code for an invoice, gated on the supplier having complete
/// payment info.
#[get("/api/invoices/{id}/qr")]
pub async fn invoice_qr(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let invoice = db::invoices::find(&state.db_pool, auth.user.id, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let supplier = db::suppliers::find(&state.db_pool, auth.user.id, invoice.supplier_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let currency = db::reference::find_currency(&state.db_pool, invoice.currency_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !qr_payment::has_required_payment_info(&supplier, &invoice, &currency.code) {
        return Err(AppError::validation(
            "payment",
            "supplier is missing payment info for a QR code",
        ));
    }

    let payload = qr_payment::spd_payload(
        supplier.iban.as_deref().unwrap_or_default(),
        invoice.total,
        &currency.code,
        invoice.variable_symbol.as_deref(),
        invoice.message.as_deref(),
    );
    let png = qr_payment::qr_png(&payload, 256)?;
    Ok(HttpResponse::Ok().content_type("image/png").body(png))
}

#[derive(Deserialize)]
pub struct PdfQuery {
    pub locale: Option<String>,
}

#[get("/api/invoices/{id}/pdf")]
pub async fn invoice_pdf(
    state: Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<PdfQuery>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let invoice = db::invoices::find(&state.db_pool, auth.user.id, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let supplier = db::suppliers::find(&state.db_pool, auth.user.id, invoice.supplier_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let client = db::clients::find(&state.db_pool, auth.user.id, invoice.client_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let currency = db::reference::find_currency(&state.db_pool, invoice.currency_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let payment_methods = db::reference::list_payment_methods(&state.db_pool).await?;
    let payment_method = payment_methods
        .iter()
        .find(|m| m.id == invoice.payment_method_id)
        .map(|m| m.name.as_str())
        .unwrap_or("bank_transfer");

    let items = crate::services::invoice_sync::parse_line_items(&invoice.invoice_text)?;
    let locale = query
        .locale
        .clone()
        .filter(|l| state.config.supports_locale(l))
        .unwrap_or_else(|| state.config.default_locale().to_string());

    let bytes = pdf::render(&pdf::InvoicePdf {
        invoice: &invoice,
        supplier: &supplier,
        client: &client,
        items: &items,
        currency_code: &currency.code,
        payment_method,
        locale: &locale,
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .append_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}.pdf\"", invoice.number),
        ))
        .body(bytes))
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[get("/api/countries")]
pub async fn list_countries(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(db::reference::list_countries(&state.db_pool).await?))
}

#[get("/api/currencies")]
pub async fn list_currencies(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(db::reference::list_currencies(&state.db_pool).await?))
}

#[get("/api/banks")]
pub async fn list_banks(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(db::reference::list_banks(&state.db_pool).await?))
}

#[get("/api/taxes")]
pub async fn list_taxes(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(db::reference::list_taxes(&state.db_pool).await?))
}

#[get("/api/payment-methods")]
pub async fn list_payment_methods(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(db::reference::list_payment_methods(&state.db_pool).await?))
}

#[get("/api/statuses")]
pub async fn list_statuses(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(db::reference::list_statuses(&state.db_pool).await?))
}

// ---------------------------------------------------------------------------
// ARES lookup, stats, tokens
// ---------------------------------------------------------------------------

#[get("/api/ares/{ico}")]
pub async fn ares_lookup(
    state: Data<AppState>,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    let info = state.ares.lookup(&path).await?;
    Ok(HttpResponse::Ok().json(info))
}

#[get("/api/stats")]
pub async fn dashboard_stats(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(stats::dashboard(&state.db_pool, auth.user.id).await?))
}

#[derive(Deserialize)]
pub struct NewToken {
    pub name: String,
}

/// Issues a fresh API token. Only session guards may mint tokens; a token
/// cannot be used to create more tokens.
#[post("/api/tokens")]
pub async fn create_token(
    state: Data<AppState>,
    input: web::Json<NewToken>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    if auth.guard == Guard::ApiToken {
        return Err(AppError::Forbidden);
    }
    if !auth::has_permission_to(&state.db_pool, &auth, "issue_api_tokens").await? {
        return Err(AppError::Forbidden);
    }

    let plaintext = auth::generate_token();
    let token =
        db::tokens::create(&state.db_pool, auth.user.id, &input.name, &auth::token_hash(&plaintext))
            .await?;
    // The plaintext leaves the server exactly once.
    Ok(HttpResponse::Created().json(json!({ "token": token, "plaintext": plaintext })))
}

#[get("/api/tokens")]
pub async fn list_tokens(
    state: Data<AppState>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    Ok(HttpResponse::Ok().json(db::tokens::list(&state.db_pool, auth.user.id).await?))
}

#[delete("/api/tokens/{id}")]
pub async fn delete_token(
    state: Data<AppState>,
    path: web::Path<i64>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let auth = auth::require_user(&state.db_pool, identity.as_ref(), &req).await?;
    db::tokens::delete(&state.db_pool, auth.user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
