//! Checksum validators for bank and company identifiers.
//!
//! These gate client/supplier/invoice writes and the ARES lookup. All of them
//! return field-keyed validation errors so the API can surface 422 payloads.

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::AppError;

lazy_static! {
    static ref SWIFT_RE: Regex = Regex::new(r"^[A-Z]{6}[A-Z0-9]{2}([A-Z0-9]{3})?$").unwrap();
    static ref DIC_RE: Regex = Regex::new(r"^CZ\d{8,10}$").unwrap();
}

/// Validates an IBAN: length, charset and the ISO 13616 mod-97 checksum.
///
/// The rearranged string is reduced digit-by-digit, so no big-integer
/// arithmetic is needed.
pub fn validate_iban(iban: &str) -> Result<(), AppError> {
    let compact: String = iban
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.len() < 15 || compact.len() > 34 {
        return Err(AppError::validation("iban", "length must be 15-34 characters"));
    }
    if !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::validation("iban", "contains invalid characters"));
    }
    if !compact.chars().take(2).all(|c| c.is_ascii_uppercase()) {
        return Err(AppError::validation("iban", "must start with a country code"));
    }

    // Move the country code and check digits to the end, then mod-97.
    let rearranged = format!("{}{}", &compact[4..], &compact[..4]);
    let mut rem: u32 = 0;
    for c in rearranged.chars() {
        if let Some(d) = c.to_digit(10) {
            rem = (rem * 10 + d) % 97;
        } else {
            let v = (c as u32) - ('A' as u32) + 10;
            rem = (rem * 100 + v) % 97;
        }
    }

    if rem != 1 {
        return Err(AppError::validation("iban", "checksum failed"));
    }
    Ok(())
}

/// Validates a Czech company identifier (IČO): 8 digits with a weighted
/// mod-11 check digit.
pub fn validate_ico(ico: &str) -> Result<(), AppError> {
    let trimmed = ico.trim();

    if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("ico", "must be exactly 8 digits"));
    }

    let digits: Vec<u32> = trimmed.chars().filter_map(|c| c.to_digit(10)).collect();
    let sum: u32 = digits[..7]
        .iter()
        .enumerate()
        .map(|(i, d)| d * (8 - i as u32))
        .sum();
    let check = (11 - sum % 11) % 10;

    if digits[7] != check {
        return Err(AppError::validation("ico", "check digit mismatch"));
    }
    Ok(())
}

/// Validates a Czech VAT identifier (DIČ): `CZ` followed by 8-10 digits.
pub fn validate_dic(dic: &str) -> Result<(), AppError> {
    if !DIC_RE.is_match(dic.trim()) {
        return Err(AppError::validation("dic", "expected CZ followed by 8-10 digits"));
    }
    Ok(())
}

/// Validates a SWIFT/BIC code (8 or 11 characters).
pub fn validate_swift(swift: &str) -> Result<(), AppError> {
    if !SWIFT_RE.is_match(swift.trim()) {
        return Err(AppError::validation("swift", "invalid SWIFT/BIC format"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_good_ibans() {
        assert!(validate_iban("CZ6508000000192000145399").is_ok());
        assert!(validate_iban("GB82 WEST 1234 5698 7654 32").is_ok());
        assert!(validate_iban("DE89370400440532013000").is_ok());
    }

    #[test]
    fn rejects_corrupted_iban() {
        // Single flipped digit breaks the mod-97 checksum.
        assert!(validate_iban("CZ6508000000192000145398").is_err());
        assert!(validate_iban("CZ65").is_err());
        assert!(validate_iban("CZ65080000001920001453!9").is_err());
        assert!(validate_iban("126508000000192000145399").is_err());
    }

    #[test]
    fn ico_check_digit() {
        // Real registry entries.
        assert!(validate_ico("25596641").is_ok());
        assert!(validate_ico("00006947").is_ok());
        assert!(validate_ico("25596642").is_err());
        assert!(validate_ico("1234567").is_err());
        assert!(validate_ico("abcdefgh").is_err());
    }

    #[test]
    fn dic_format() {
        assert!(validate_dic("CZ25596641").is_ok());
        assert!(validate_dic("CZ1234567890").is_ok());
        assert!(validate_dic("SK25596641").is_err());
        assert!(validate_dic("CZ1234").is_err());
    }

    #[test]
    fn swift_format() {
        assert!(validate_swift("GIBACZPX").is_ok());
        assert!(validate_swift("DEUTDEFF500").is_ok());
        assert!(validate_swift("GIBACZ").is_err());
        assert!(validate_swift("gibaczpx").is_err());
    }
}
