use std::env;

use actix_web::cookie::Key;

/// Runtime configuration, collected from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub locales: Vec<String>,
    pub ares_base_url: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", "sqlite://fakturo.db"),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            locales: env_or("APP_LOCALES", "cs,en")
                .split(',')
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
            ares_base_url: env_or(
                "ARES_BASE_URL",
                "https://ares.gov.cz/ekonomicke-subjekty-v-be/rest",
            ),
        }
    }

    /// First entry of the locale list is the default.
    pub fn default_locale(&self) -> &str {
        self.locales.first().map(String::as_str).unwrap_or("en")
    }

    pub fn supports_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        log::info!("{} not set, using default: {}", key, default);
        default.to_string()
    })
}

pub fn session_key() -> Key {
    let key_str = env::var("SESSION_KEY").unwrap_or_else(|_| {
        log::error!("FATAL: SESSION_KEY environment variable not set");
        std::process::exit(1);
    });
    Key::from(key_str.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_list_parses_and_defaults() {
        std::env::set_var("APP_LOCALES", "cs, en ,de");
        let config = Config::load();
        assert_eq!(config.locales, vec!["cs", "en", "de"]);
        assert_eq!(config.default_locale(), "cs");
        assert!(config.supports_locale("de"));
        assert!(!config.supports_locale("fr"));
        std::env::remove_var("APP_LOCALES");
    }
}
