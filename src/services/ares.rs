//! Lookup against the ARES national company registry, used to autofill
//! client/supplier forms from an IČO.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::validators;

#[derive(Deserialize, Debug)]
struct AresSubject {
    ico: Option<String>,
    #[serde(rename = "obchodniJmeno")]
    obchodni_jmeno: Option<String>,
    dic: Option<String>,
    sidlo: Option<AresSeat>,
}

#[derive(Deserialize, Debug)]
struct AresSeat {
    #[serde(rename = "nazevUlice")]
    nazev_ulice: Option<String>,
    #[serde(rename = "cisloDomovni")]
    cislo_domovni: Option<i64>,
    #[serde(rename = "nazevObce")]
    nazev_obce: Option<String>,
    psc: Option<i64>,
}

/// What the form autofill consumes.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompanyInfo {
    pub ico: String,
    pub name: String,
    pub dic: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

fn company_from_subject(ico: &str, subject: AresSubject) -> CompanyInfo {
    let (street, city, zip) = match subject.sidlo {
        Some(seat) => {
            let street = match (seat.nazev_ulice, seat.cislo_domovni) {
                (Some(street), Some(number)) => Some(format!("{} {}", street, number)),
                (Some(street), None) => Some(street),
                (None, _) => None,
            };
            (street, seat.nazev_obce, seat.psc.map(|p| p.to_string()))
        }
        None => (None, None, None),
    };
    CompanyInfo {
        ico: subject.ico.unwrap_or_else(|| ico.to_string()),
        name: subject.obchodni_jmeno.unwrap_or_default(),
        dic: subject.dic,
        street,
        city,
        zip,
    }
}

#[derive(Clone)]
pub struct AresClient {
    http: reqwest::Client,
    base_url: String,
}

impl AresClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    pub async fn lookup(&self, ico: &str) -> Result<CompanyInfo, AppError> {
        validators::validate_ico(ico)?;

        let url = format!("{}/ekonomicke-subjekty/{}", self.base_url, ico);
        let response = self.http.get(&url).send().await.map_err(|e| {
            log::error!("ARES request failed: {}", e);
            AppError::Registry(e.to_string())
        })?;

        match response.status() {
            status if status.is_success() => {
                let subject: AresSubject = response.json().await.map_err(|e| {
                    log::error!("ARES returned unparseable payload: {}", e);
                    AppError::Registry(e.to_string())
                })?;
                Ok(company_from_subject(ico, subject))
            }
            reqwest::StatusCode::NOT_FOUND => Err(AppError::NotFound),
            status => {
                log::error!("ARES returned status {} for ico {}", status, ico);
                Err(AppError::Registry(format!("registry returned {}", status)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "ico": "25596641",
        "obchodniJmeno": "Seznam.cz, a.s.",
        "dic": "CZ25596641",
        "sidlo": {
            "nazevUlice": "Radlická",
            "cisloDomovni": 3294,
            "nazevObce": "Praha",
            "psc": 15000
        }
    }"#;

    #[test]
    fn parses_registry_payload() {
        let subject: AresSubject = serde_json::from_str(FIXTURE).unwrap();
        let info = company_from_subject("25596641", subject);
        assert_eq!(info.name, "Seznam.cz, a.s.");
        assert_eq!(info.dic.as_deref(), Some("CZ25596641"));
        assert_eq!(info.street.as_deref(), Some("Radlická 3294"));
        assert_eq!(info.city.as_deref(), Some("Praha"));
        assert_eq!(info.zip.as_deref(), Some("15000"));
    }

    #[test]
    fn missing_seat_yields_bare_company() {
        let subject: AresSubject =
            serde_json::from_str(r#"{"obchodniJmeno": "Test s.r.o."}"#).unwrap();
        let info = company_from_subject("25596641", subject);
        assert_eq!(info.ico, "25596641");
        assert_eq!(info.name, "Test s.r.o.");
        assert!(info.street.is_none());
    }

    #[tokio::test]
    async fn invalid_ico_is_rejected_before_any_request() {
        let client = AresClient::new(reqwest::Client::new(), "http://127.0.0.1:1".into());
        let err = client.lookup("not-an-ico").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
