//! Locale handling and the label table used by templates and the PDF renderer.

use actix_session::Session;

use crate::config::Config;

pub const SESSION_LOCALE_KEY: &str = "locale";

/// Picks the active locale: an explicitly supported URL locale wins, then the
/// session-persisted one, then the configured default.
pub fn resolve_locale(config: &Config, url_locale: &str, session: &Session) -> String {
    if config.supports_locale(url_locale) {
        return url_locale.to_string();
    }
    if let Ok(Some(saved)) = session.get::<String>(SESSION_LOCALE_KEY) {
        if config.supports_locale(&saved) {
            return saved;
        }
    }
    config.default_locale().to_string()
}

pub fn remember_locale(session: &Session, locale: &str) {
    if let Err(e) = session.insert(SESSION_LOCALE_KEY, locale) {
        log::warn!("Failed to persist locale in session: {}", e);
    }
}

/// Translated label lookup with English fallback. Unknown keys come back
/// empty so a missing entry never panics a render.
pub fn t(locale: &str, key: &str) -> &'static str {
    let translated = match locale {
        "cs" => cs(key),
        _ => None,
    };
    translated.or_else(|| en(key)).unwrap_or("")
}

fn cs(key: &str) -> Option<&'static str> {
    Some(match key {
        "invoice" => "Faktura",
        "invoices" => "Faktury",
        "clients" => "Odběratelé",
        "client" => "Odběratel",
        "suppliers" => "Dodavatelé",
        "supplier" => "Dodavatel",
        "products" => "Produkty",
        "dashboard" => "Přehled",
        "issue_date" => "Datum vystavení",
        "due_date" => "Datum splatnosti",
        "taxable_date" => "Datum zdanitelného plnění",
        "variable_symbol" => "Variabilní symbol",
        "constant_symbol" => "Konstantní symbol",
        "payment_method" => "Způsob platby",
        "bank_account" => "Bankovní účet",
        "item" => "Položka",
        "quantity" => "Množství",
        "unit" => "MJ",
        "unit_price" => "Cena za MJ",
        "tax" => "DPH",
        "subtotal" => "Základ",
        "total" => "Celkem",
        "total_due" => "Celkem k úhradě",
        "ico" => "IČO",
        "dic" => "DIČ",
        "login" => "Přihlásit se",
        "change_password" => "Změna hesla",
        "current_password" => "Současné heslo",
        "new_password" => "Nové heslo",
        "logout" => "Odhlásit se",
        "register" => "Registrovat",
        "email" => "E-mail",
        "password" => "Heslo",
        "name" => "Název",
        "status" => "Stav",
        "currency" => "Měna",
        "users" => "Uživatelé",
        "administration" => "Administrace",
        _ => return None,
    })
}

fn en(key: &str) -> Option<&'static str> {
    Some(match key {
        "invoice" => "Invoice",
        "invoices" => "Invoices",
        "clients" => "Clients",
        "client" => "Client",
        "suppliers" => "Suppliers",
        "supplier" => "Supplier",
        "products" => "Products",
        "dashboard" => "Dashboard",
        "issue_date" => "Issue date",
        "due_date" => "Due date",
        "taxable_date" => "Taxable supply date",
        "variable_symbol" => "Variable symbol",
        "constant_symbol" => "Constant symbol",
        "payment_method" => "Payment method",
        "bank_account" => "Bank account",
        "item" => "Item",
        "quantity" => "Quantity",
        "unit" => "Unit",
        "unit_price" => "Unit price",
        "tax" => "VAT",
        "subtotal" => "Subtotal",
        "total" => "Total",
        "total_due" => "Total due",
        "ico" => "Company ID",
        "dic" => "VAT ID",
        "login" => "Log in",
        "change_password" => "Change password",
        "current_password" => "Current password",
        "new_password" => "New password",
        "logout" => "Log out",
        "register" => "Register",
        "email" => "E-mail",
        "password" => "Password",
        "name" => "Name",
        "status" => "Status",
        "currency" => "Currency",
        "users" => "Users",
        "administration" => "Administration",
        _ => return None,
    })
}

/// Labels handed to tera as a map so templates can do `{{ t.invoices }}`.
pub fn label_map(locale: &str) -> std::collections::HashMap<&'static str, &'static str> {
    const KEYS: &[&str] = &[
        "invoice",
        "invoices",
        "clients",
        "client",
        "suppliers",
        "supplier",
        "products",
        "dashboard",
        "issue_date",
        "due_date",
        "taxable_date",
        "variable_symbol",
        "constant_symbol",
        "payment_method",
        "bank_account",
        "item",
        "quantity",
        "unit",
        "unit_price",
        "tax",
        "subtotal",
        "total",
        "total_due",
        "ico",
        "dic",
        "login",
        "change_password",
        "current_password",
        "new_password",
        "logout",
        "register",
        "email",
        "password",
        "name",
        "status",
        "currency",
        "users",
        "administration",
    ];
    KEYS.iter().map(|k| (*k, t(locale, k))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn czech_labels_resolve() {
        assert_eq!(t("cs", "invoice"), "Faktura");
        assert_eq!(t("cs", "due_date"), "Datum splatnosti");
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        assert_eq!(t("de", "invoice"), "Invoice");
        assert_eq!(t("en", "tax"), "VAT");
    }

    #[test]
    fn unknown_key_is_empty() {
        assert_eq!(t("cs", "no-such-key"), "");
    }

    #[test]
    fn label_map_covers_all_keys() {
        let map = label_map("cs");
        assert_eq!(map.get("invoices"), Some(&"Faktury"));
        assert!(map.values().all(|v| !v.is_empty()));
    }
}
