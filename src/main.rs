use std::str::FromStr;

use actix_files::{Files, NamedFile};
use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    http::{Method, StatusCode},
    middleware,
    web::{self, Data},
    App, Either, HttpResponse, HttpServer, Responder,
};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::SqlitePool;

use fakturo::config::{self, Config};
use fakturo::routes::{admin, api, frontend};
use fakturo::services::ares::AresClient;
use fakturo::{AppState, MIGRATOR};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = Config::load();

    let opts = SqliteConnectOptions::from_str(&app_config.database_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    MIGRATOR
        .run(&db_pool)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    info!("Database migrated successfully");

    let state = AppState {
        db_pool,
        ares: AresClient::new(reqwest::Client::new(), app_config.ares_base_url.clone()),
        config: app_config.clone(),
    };

    info!("Starting HTTP server on http://{}/", app_config.bind_addr);

    let bind_addr = app_config.bind_addr.clone();
    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                config::session_key(),
            ))
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            // JSON API first: the locale-prefixed routes below use dynamic
            // segments that would otherwise swallow /api paths
            .service(api::list_clients)
            .service(api::create_client)
            .service(api::get_client)
            .service(api::update_client)
            .service(api::delete_client)
            .service(api::list_suppliers)
            .service(api::create_supplier)
            .service(api::get_supplier)
            .service(api::update_supplier)
            .service(api::delete_supplier)
            .service(api::list_products)
            .service(api::create_product)
            .service(api::update_product)
            .service(api::delete_product)
            .service(api::list_invoices)
            .service(api::create_invoice)
            .service(api::get_invoice)
            .service(api::update_invoice)
            .service(api::set_invoice_status)
            .service(api::delete_invoice)
            .service(api::invoice_qr)
            .service(api::invoice_pdf)
            .service(api::list_countries)
            .service(api::list_currencies)
            .service(api::list_banks)
            .service(api::list_taxes)
            .service(api::list_payment_methods)
            .service(api::list_statuses)
            .service(api::ares_lookup)
            .service(api::dashboard_stats)
            .service(api::create_token)
            .service(api::list_tokens)
            .service(api::delete_token)
            // back office
            .service(admin::login_handler)
            .service(admin::login_form_handler)
            .service(admin::users_handler)
            .service(admin::create_user_handler)
            .service(admin::delete_user_handler)
            .service(admin::reference_handler)
            .service(admin::create_tax_handler)
            .service(admin::delete_tax_handler)
            .service(admin::create_bank_handler)
            .service(admin::delete_bank_handler)
            // front office
            .service(frontend::root_redirect)
            .service(frontend::switch_locale)
            .service(frontend::login_handler)
            .service(frontend::login_form_handler)
            .service(frontend::register_handler)
            .service(frontend::register_form_handler)
            .service(frontend::change_pwd_handler)
            .service(frontend::change_pwd_form_handler)
            .service(frontend::logout_handler)
            .service(frontend::dashboard_handler)
            .service(frontend::invoices_handler)
            .service(frontend::invoice_detail_handler)
            .service(frontend::clients_handler)
            .service(frontend::suppliers_handler)
            .service(frontend::products_handler)
            .service(frontend::index_handler)
            .app_data(Data::new(state.clone()))
            .default_service(web::to(default_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}

async fn default_handler(req_method: Method) -> Result<impl Responder, std::io::Error> {
    match req_method {
        Method::GET => {
            let file = NamedFile::open("static/404.html")?
                .customize()
                .with_status(StatusCode::NOT_FOUND);
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}
