//! Server-rendered front-office pages under the locale prefix.

use actix_identity::Identity;
use actix_session::Session;
use actix_web::{
    get, post,
    web::{self, Data},
    HttpMessage, HttpRequest, HttpResponse, Responder,
};
use serde::Deserialize;

use crate::auth::{self, Realm};
use crate::db;
use crate::errors::AppError;
use crate::i18n;
use crate::routes::{base_context, render, see_other};
use crate::stats;
use crate::utils;
use crate::AppState;

/// Redirects an unsupported URL locale to the same path under the default
/// one; returns the resolved locale otherwise.
fn locale_or_redirect(
    state: &AppState,
    session: &Session,
    url_locale: &str,
    rest: &str,
) -> Result<String, HttpResponse> {
    if state.config.supports_locale(url_locale) {
        let locale = i18n::resolve_locale(&state.config, url_locale, session);
        i18n::remember_locale(session, &locale);
        Ok(locale)
    } else {
        Err(see_other(&format!(
            "/{}/{}",
            state.config.default_locale(),
            rest.trim_start_matches('/')
        )))
    }
}

#[get("/")]
pub async fn root_redirect(state: Data<AppState>, session: Session) -> impl Responder {
    let locale = i18n::resolve_locale(&state.config, "", &session);
    see_other(&format!("/{}/", locale))
}

#[get("/locale/{code}")]
pub async fn switch_locale(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> impl Responder {
    let code = path.into_inner();
    let locale = if state.config.supports_locale(&code) {
        code
    } else {
        state.config.default_locale().to_string()
    };
    i18n::remember_locale(&session, &locale);
    see_other(&format!("/{}/", locale))
}

#[get("/{locale}/")]
pub async fn index_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let auth = auth::authenticate(&state.db_pool, identity.as_ref(), &req).await?;
    let mut context = base_context(&state.config, &locale);
    context.insert("logged_in", &auth.is_some());
    if let Some(auth) = &auth {
        context.insert("user_name", &auth.user.name);
    }
    render("home.html", &context)
}

#[get("/{locale}/login")]
pub async fn login_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "login") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    render("login.html", &base_context(&state.config, &locale))
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

#[post("/{locale}/login")]
pub async fn login_form_handler(
    web::Form(form): web::Form<LoginForm>,
    state: Data<AppState>,
    path: web::Path<String>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = path.into_inner();
    if form.email.is_empty() || form.password.is_empty() {
        return Ok(HttpResponse::BadRequest().body("All fields are required"));
    }

    match auth::check_credentials(&state.db_pool, &form.email, &form.password).await? {
        Some(user) => {
            Identity::login(&request.extensions(), auth::session_value(Realm::Web, user.id))
                .map_err(|e| AppError::Session(e.to_string()))?;
            Ok(see_other(&format!("/{}/dashboard", locale)))
        }
        None => Ok(HttpResponse::Unauthorized().body("Invalid credentials")),
    }
}

#[get("/{locale}/register")]
pub async fn register_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "register") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    render("register.html", &base_context(&state.config, &locale))
}

#[derive(Deserialize)]
pub struct RegisterForm {
    name: String,
    email: String,
    password: String,
    password2: String,
}

#[post("/{locale}/register")]
pub async fn register_form_handler(
    web::Form(form): web::Form<RegisterForm>,
    state: Data<AppState>,
    path: web::Path<String>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = path.into_inner();

    if form.name.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return Ok(HttpResponse::BadRequest().body("All fields are required"));
    }
    if form.password != form.password2 {
        return Ok(HttpResponse::BadRequest().body("Passwords do not match"));
    }
    if !form.email.contains('@') {
        return Ok(HttpResponse::BadRequest().body("Invalid email address"));
    }
    if form.password.len() < 12 {
        return Ok(HttpResponse::BadRequest().body("Password must be at least 12 characters long"));
    }
    if form.password.len() > 128 {
        return Ok(HttpResponse::BadRequest().body("Password must be at most 128 characters long"));
    }

    let lc_email = form.email.to_lowercase();
    if db::users::find_by_email(&state.db_pool, &lc_email).await?.is_some() {
        return Ok(HttpResponse::BadRequest().body("E-mail is already registered"));
    }

    let user = db::users::create(
        &state.db_pool,
        &form.name,
        &lc_email,
        &form.password,
        auth::ROLE_USER,
    )
    .await?;

    Identity::login(&request.extensions(), auth::session_value(Realm::Web, user.id))
        .map_err(|e| AppError::Session(e.to_string()))?;

    Ok(see_other(&format!("/{}/dashboard", locale)))
}

#[get("/{locale}/change-pwd")]
pub async fn change_pwd_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "change-pwd") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let auth = match auth::authenticate(&state.db_pool, identity.as_ref(), &req).await? {
        Some(auth) => auth,
        None => return Ok(see_other(&format!("/{}/login", locale))),
    };
    let mut context = base_context(&state.config, &locale);
    context.insert("user_name", &auth.user.name);
    render("change_pwd.html", &context)
}

#[derive(Deserialize)]
pub struct ChangePwdForm {
    current_password: String,
    new_password: String,
    new_password2: String,
}

#[post("/{locale}/change-pwd")]
pub async fn change_pwd_form_handler(
    web::Form(form): web::Form<ChangePwdForm>,
    state: Data<AppState>,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = path.into_inner();
    let auth = match auth::authenticate(&state.db_pool, identity.as_ref(), &req).await? {
        Some(auth) => auth,
        None => return Ok(see_other(&format!("/{}/login", locale))),
    };

    if !utils::verify_password(&form.current_password, &auth.user.pwd_hash) {
        return Ok(HttpResponse::Unauthorized().body("Invalid credentials"));
    }
    if form.new_password != form.new_password2 {
        return Ok(HttpResponse::BadRequest().body("Passwords do not match"));
    }
    if form.new_password.len() < 12 {
        return Ok(HttpResponse::BadRequest().body("Password must be at least 12 characters long"));
    }
    if form.new_password.len() > 128 {
        return Ok(HttpResponse::BadRequest().body("Password must be at most 128 characters long"));
    }

    db::users::update_password(&state.db_pool, auth.user.id, &form.new_password).await?;
    Ok(see_other(&format!("/{}/dashboard", locale)))
}

#[post("/{locale}/logout")]
pub async fn logout_handler(path: web::Path<String>, user: Identity) -> impl Responder {
    let locale = path.into_inner();
    user.logout();
    see_other(&format!("/{}/", locale))
}

#[get("/{locale}/dashboard")]
pub async fn dashboard_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "dashboard") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };

    let auth = match auth::authenticate(&state.db_pool, identity.as_ref(), &req).await? {
        Some(auth) => auth,
        None => return Ok(see_other(&format!("/{}/login", locale))),
    };

    let dashboard = stats::dashboard(&state.db_pool, auth.user.id).await?;
    let mut context = base_context(&state.config, &locale);
    context.insert("user_name", &auth.user.name);
    context.insert("overview", &dashboard.overview);
    context.insert("revenue_by_month", &dashboard.revenue_by_month);
    context.insert("invoices_by_status", &dashboard.invoices_by_status);
    context.insert("revenue_by_currency", &dashboard.revenue_by_currency);
    render("dashboard.html", &context)
}

#[get("/{locale}/invoices")]
pub async fn invoices_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "invoices") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let auth = match auth::authenticate(&state.db_pool, identity.as_ref(), &req).await? {
        Some(auth) => auth,
        None => return Ok(see_other(&format!("/{}/login", locale))),
    };

    let invoices = db::invoices::list(&state.db_pool, auth.user.id).await?;
    let statuses = db::reference::list_statuses(&state.db_pool).await?;
    let mut context = base_context(&state.config, &locale);
    context.insert("user_name", &auth.user.name);
    context.insert("invoices", &invoices);
    context.insert("statuses", &statuses);
    render("invoices.html", &context)
}

#[get("/{locale}/invoices/{id}")]
pub async fn invoice_detail_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<(String, i64)>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (url_locale, id) = path.into_inner();
    let locale = match locale_or_redirect(&state, &session, &url_locale, "invoices") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let auth = match auth::authenticate(&state.db_pool, identity.as_ref(), &req).await? {
        Some(auth) => auth,
        None => return Ok(see_other(&format!("/{}/login", locale))),
    };

    let invoice = db::invoices::find(&state.db_pool, auth.user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let items = db::invoices::list_items(&state.db_pool, invoice.id).await?;
    let supplier = db::suppliers::find(&state.db_pool, auth.user.id, invoice.supplier_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let client = db::clients::find(&state.db_pool, auth.user.id, invoice.client_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let currency = db::reference::find_currency(&state.db_pool, invoice.currency_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let qr_available = crate::services::qr_payment::has_required_payment_info(
        &supplier,
        &invoice,
        &currency.code,
    );

    let mut context = base_context(&state.config, &locale);
    context.insert("user_name", &auth.user.name);
    context.insert("invoice", &invoice);
    context.insert("items", &items);
    context.insert("supplier", &supplier);
    context.insert("client", &client);
    context.insert("currency", &currency);
    context.insert("qr_available", &qr_available);
    render("invoice_detail.html", &context)
}

#[get("/{locale}/clients")]
pub async fn clients_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "clients") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let auth = match auth::authenticate(&state.db_pool, identity.as_ref(), &req).await? {
        Some(auth) => auth,
        None => return Ok(see_other(&format!("/{}/login", locale))),
    };
    let clients = db::clients::list(&state.db_pool, auth.user.id).await?;
    let mut context = base_context(&state.config, &locale);
    context.insert("user_name", &auth.user.name);
    context.insert("clients", &clients);
    render("clients.html", &context)
}

#[get("/{locale}/suppliers")]
pub async fn suppliers_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "suppliers") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let auth = match auth::authenticate(&state.db_pool, identity.as_ref(), &req).await? {
        Some(auth) => auth,
        None => return Ok(see_other(&format!("/{}/login", locale))),
    };
    let suppliers = db::suppliers::list(&state.db_pool, auth.user.id).await?;
    let mut context = base_context(&state.config, &locale);
    context.insert("user_name", &auth.user.name);
    context.insert("suppliers", &suppliers);
    render("suppliers.html", &context)
}

#[get("/{locale}/products")]
pub async fn products_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &session, &path, "products") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let auth = match auth::authenticate(&state.db_pool, identity.as_ref(), &req).await? {
        Some(auth) => auth,
        None => return Ok(see_other(&format!("/{}/login", locale))),
    };
    let products = db::products::list(&state.db_pool, auth.user.id).await?;
    let mut context = base_context(&state.config, &locale);
    context.insert("user_name", &auth.user.name);
    context.insert("products", &products);
    render("products.html", &context)
}
