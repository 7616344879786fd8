//! Back-office pages under `/{locale}/admin`. Only reachable through the
//! admin session guard; the admin role is checked at login and again on every
//! handler.

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
use crate::AppState;

async fn require_admin_page(
    state: &AppState,
    identity: Option<&Identity>,
    req: &HttpRequest,
) -> Result<auth::AuthUser, AppError> {
    let auth = auth::require_user(&state.db_pool, identity, req).await?;
    auth::require_admin(&auth)?;
    Ok(auth)
}

/// Same unsupported-locale handling as the front office: redirect to the
/// default-locale variant of the page.
fn locale_or_redirect(
    state: &AppState,
    url_locale: &str,
    rest: &str,
) -> Result<String, HttpResponse> {
    if state.config.supports_locale(url_locale) {
        Ok(url_locale.to_string())
    } else {
        Err(see_other(&format!(
            "/{}/{}",
            state.config.default_locale(),
            rest
        )))
    }
}

#[get("/{locale}/admin/login")]
pub async fn login_handler(
    state: Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let url_locale = match locale_or_redirect(&state, &path, "admin/login") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    i18n::remember_locale(&session, &url_locale);
    render("admin/login.html", &base_context(&state.config, &url_locale))
}

#[derive(Deserialize)]
pub struct AdminLoginForm {
    email: String,
    password: String,
}

#[post("/{locale}/admin/login")]
pub async fn login_form_handler(
    web::Form(form): web::Form<AdminLoginForm>,
    state: Data<AppState>,
    path: web::Path<String>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &path, "admin/login") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    if form.email.is_empty() || form.password.is_empty() {
        return Ok(HttpResponse::BadRequest().body("All fields are required"));
    }

    match auth::check_credentials(&state.db_pool, &form.email, &form.password).await? {
        Some(user) if user.role == auth::ROLE_ADMIN => {
            Identity::login(&request.extensions(), auth::session_value(Realm::Admin, user.id))
                .map_err(|e| AppError::Session(e.to_string()))?;
            Ok(see_other(&format!("/{}/admin", locale)))
        }
        Some(_) => {
            log::warn!("Non-admin account attempted back-office login");
            Ok(HttpResponse::Unauthorized().body("Invalid credentials"))
        }
        None => Ok(HttpResponse::Unauthorized().body("Invalid credentials")),
    }
}

#[get("/{locale}/admin")]
pub async fn users_handler(
    state: Data<AppState>,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &path, "admin") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let _auth = require_admin_page(&state, identity.as_ref(), &req).await?;

    let users = db::users::get_all(&state.db_pool).await?;
    let mut context = base_context(&state.config, &locale);
    context.insert("users", &users);
    render("admin/users.html", &context)
}

#[derive(Deserialize)]
pub struct NewUserForm {
    name: String,
    email: String,
    password: String,
    role: String,
}

#[post("/{locale}/admin/users")]
pub async fn create_user_handler(
    web::Form(form): web::Form<NewUserForm>,
    state: Data<AppState>,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &path, "admin") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let _auth = require_admin_page(&state, identity.as_ref(), &req).await?;

    if form.name.is_empty() || !form.email.contains('@') || form.password.len() < 12 {
        return Ok(HttpResponse::BadRequest().body("Invalid user data"));
    }
    let role = match form.role.as_str() {
        "admin" => auth::ROLE_ADMIN,
        _ => auth::ROLE_USER,
    };
    db::users::create(&state.db_pool, &form.name, &form.email.to_lowercase(), &form.password, role)
        .await?;
    Ok(see_other(&format!("/{}/admin", locale)))
}

#[post("/{locale}/admin/users/{id}/delete")]
pub async fn delete_user_handler(
    state: Data<AppState>,
    path: web::Path<(String, i64)>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (url_locale, id) = path.into_inner();
    let locale = match locale_or_redirect(&state, &url_locale, "admin") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let auth = require_admin_page(&state, identity.as_ref(), &req).await?;

    // An admin removing their own account would orphan the session.
    if auth.user.id == id {
        return Ok(HttpResponse::BadRequest().body("Cannot delete the active account"));
    }
    db::users::delete(&state.db_pool, id).await?;
    Ok(see_other(&format!("/{}/admin", locale)))
}

#[get("/{locale}/admin/reference")]
pub async fn reference_handler(
    state: Data<AppState>,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &path, "admin/reference") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let auth = require_admin_page(&state, identity.as_ref(), &req).await?;
    if !auth::has_permission_to(&state.db_pool, &auth, "manage_reference_data").await? {
        return Err(AppError::Forbidden);
    }

    let mut context = base_context(&state.config, &locale);
    context.insert("taxes", &db::reference::list_taxes(&state.db_pool).await?);
    context.insert("banks", &db::reference::list_banks(&state.db_pool).await?);
    context.insert("currencies", &db::reference::list_currencies(&state.db_pool).await?);
    context.insert("countries", &db::reference::list_countries(&state.db_pool).await?);
    context.insert(
        "payment_methods",
        &db::reference::list_payment_methods(&state.db_pool).await?,
    );
    context.insert("statuses", &db::reference::list_statuses(&state.db_pool).await?);
    render("admin/reference.html", &context)
}

#[post("/{locale}/admin/taxes")]
pub async fn create_tax_handler(
    web::Form(form): web::Form<db::reference::TaxInput>,
    state: Data<AppState>,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &path, "admin/reference") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let _auth = require_admin_page(&state, identity.as_ref(), &req).await?;
    db::reference::create_tax(&state.db_pool, &form).await?;
    Ok(see_other(&format!("/{}/admin/reference", locale)))
}

#[post("/{locale}/admin/taxes/{id}/delete")]
pub async fn delete_tax_handler(
    state: Data<AppState>,
    path: web::Path<(String, i64)>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (url_locale, id) = path.into_inner();
    let locale = match locale_or_redirect(&state, &url_locale, "admin/reference") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let _auth = require_admin_page(&state, identity.as_ref(), &req).await?;
    db::reference::delete_tax(&state.db_pool, id).await?;
    Ok(see_other(&format!("/{}/admin/reference", locale)))
}

#[post("/{locale}/admin/banks")]
pub async fn create_bank_handler(
    web::Form(form): web::Form<db::reference::BankInput>,
    state: Data<AppState>,
    path: web::Path<String>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let locale = match locale_or_redirect(&state, &path, "admin/reference") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let _auth = require_admin_page(&state, identity.as_ref(), &req).await?;
    db::reference::create_bank(&state.db_pool, &form).await?;
    Ok(see_other(&format!("/{}/admin/reference", locale)))
}

#[post("/{locale}/admin/banks/{id}/delete")]
pub async fn delete_bank_handler(
    state: Data<AppState>,
    path: web::Path<(String, i64)>,
    identity: Option<Identity>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (url_locale, id) = path.into_inner();
    let locale = match locale_or_redirect(&state, &url_locale, "admin/reference") {
        Ok(locale) => locale,
        Err(redirect) => return Ok(redirect),
    };
    let _auth = require_admin_page(&state, identity.as_ref(), &req).await?;
    db::reference::delete_bank(&state.db_pool, id).await?;
    Ok(see_other(&format!("/{}/admin/reference", locale)))
}
