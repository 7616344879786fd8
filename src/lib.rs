#[macro_use]
extern crate lazy_static;

use sqlx::SqlitePool;
use tera::Tera;

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod i18n;
pub mod routes;
pub mod services;
pub mod stats;
pub mod structs;
pub mod utils;
pub mod validators;

use config::Config;
use services::ares::AresClient;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub ares: AresClient,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                log::error!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        };
        tera.autoescape_on(vec![".html"]);
        tera
    };
}

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
