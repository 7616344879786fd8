pub mod admin;
pub mod api;
pub mod frontend;

use actix_web::HttpResponse;
use tera::Context;

use crate::config::Config;
use crate::errors::AppError;
use crate::i18n;
use crate::TEMPLATES;

pub fn render(template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = TEMPLATES.render(template, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", template, e);
        AppError::Template(e)
    })?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", location.to_string()))
        .finish()
}

/// Shared template context: active locale, the configured locale list for the
/// switcher links, the label map and the app version.
pub fn base_context(config: &Config, locale: &str) -> Context {
    let mut context = Context::new();
    context.insert("locale", locale);
    context.insert("locales", &config.locales);
    context.insert("t", &i18n::label_map(locale));
    context.insert("version", env!("CARGO_PKG_VERSION"));
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            locales: vec!["cs".to_string(), "en".to_string()],
            ares_base_url: "http://127.0.0.1:1".to_string(),
        }
    }

    #[test]
    fn locale_switcher_links_follow_config() {
        let mut context = base_context(&test_config(), "cs");
        context.insert("logged_in", &false);
        let page = TEMPLATES.render("home.html", &context).unwrap();
        assert!(page.contains("/locale/cs"));
        assert!(page.contains("/locale/en"));
    }
}
