//! Czech QR payment codes (the "QR Platba" SPD 1.0 string) rendered to an
//! in-memory grayscale PNG.

use png::{BitDepth, ColorType, Encoder};
use qrcode::QrCode;

use crate::errors::AppError;
use crate::structs::{Invoice, Supplier};

/// QR generation is gated on this: without an IBAN, a positive amount and a
/// currency there is nothing a banking app could pay.
pub fn has_required_payment_info(supplier: &Supplier, invoice: &Invoice, currency_code: &str) -> bool {
    supplier.iban.as_deref().map_or(false, |i| !i.trim().is_empty())
        && invoice.total > 0.0
        && !currency_code.is_empty()
}

/// Composes the SPD 1.0 payload. The message is uppercased, stripped of the
/// `*` field separator and capped at 60 characters per the format spec.
pub fn spd_payload(
    iban: &str,
    amount: f64,
    currency: &str,
    variable_symbol: Option<&str>,
    message: Option<&str>,
) -> String {
    let iban: String = iban.chars().filter(|c| !c.is_whitespace()).collect();
    let mut payload = format!("SPD*1.0*ACC:{}*AM:{:.2}*CC:{}", iban.to_uppercase(), amount, currency);
    if let Some(vs) = variable_symbol.filter(|v| !v.is_empty()) {
        payload.push_str(&format!("*X-VS:{}", vs));
    }
    if let Some(msg) = message.filter(|m| !m.trim().is_empty()) {
        let cleaned: String = msg
            .to_uppercase()
            .chars()
            .filter(|c| *c != '*')
            .take(60)
            .collect();
        payload.push_str(&format!("*MSG:{}", cleaned));
    }
    payload
}

/// Renders the payload as a grayscale PNG scaled up to roughly `size` pixels.
pub fn qr_png(payload: &str, size: u32) -> Result<Vec<u8>, AppError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| AppError::Qr(e.to_string()))?;

    let matrix = code.to_colors();
    let qr_width = code.width();
    let scale = ((size as usize) / qr_width).max(1);
    let actual_size = qr_width * scale;

    let mut pixels: Vec<u8> = Vec::with_capacity(actual_size * actual_size);
    for y in 0..actual_size {
        for x in 0..actual_size {
            let idx = (y / scale) * qr_width + (x / scale);
            let is_dark = matrix
                .get(idx)
                .map(|c| *c == qrcode::Color::Dark)
                .unwrap_or(false);
            pixels.push(if is_dark { 0 } else { 255 });
        }
    }

    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, actual_size as u32, actual_size as u32);
        encoder.set_color(ColorType::Grayscale);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| AppError::Qr(e.to_string()))?;
        writer
            .write_image_data(&pixels)
            .map_err(|e| AppError::Qr(e.to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_has_mandatory_fields_in_order() {
        let payload = spd_payload("CZ6508000000192000145399", 1210.0, "CZK", None, None);
        assert_eq!(payload, "SPD*1.0*ACC:CZ6508000000192000145399*AM:1210.00*CC:CZK");
    }

    #[test]
    fn optional_fields_appended() {
        let payload = spd_payload(
            "CZ65 0800 0000 1920 0014 5399",
            99.5,
            "CZK",
            Some("20260001"),
            Some("Faktura *20260001*"),
        );
        assert!(payload.starts_with("SPD*1.0*ACC:CZ6508000000192000145399*AM:99.50*CC:CZK"));
        assert!(payload.contains("*X-VS:20260001"));
        assert!(payload.ends_with("*MSG:FAKTURA 20260001"));
    }

    #[test]
    fn png_output_has_signature() {
        let bytes = qr_png("SPD*1.0*ACC:CZ6508000000192000145399*AM:1.00*CC:CZK", 256).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn tiny_size_still_renders() {
        // Requested size below the QR width falls back to scale 1.
        assert!(!qr_png("SPD*1.0*ACC:X*AM:1.00*CC:CZK", 1).unwrap().is_empty());
    }

    #[test]
    fn gating_requires_iban_amount_and_currency() {
        let supplier = |iban: Option<&str>| Supplier {
            id: 1,
            user_id: 1,
            name: "ACME s.r.o.".into(),
            ico: None,
            dic: None,
            street: None,
            city: None,
            zip: None,
            country_id: None,
            email: None,
            phone: None,
            account_number: None,
            iban: iban.map(String::from),
            swift: None,
            bank_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let invoice = |total: f64| Invoice {
            id: 1,
            user_id: 1,
            number: "20260001".into(),
            client_id: 1,
            supplier_id: 1,
            currency_id: 1,
            payment_method_id: 1,
            status_id: 1,
            issued_on: "2026-01-10".into(),
            due_on: "2026-01-24".into(),
            taxable_supply_on: None,
            variable_symbol: None,
            constant_symbol: None,
            specific_symbol: None,
            message: None,
            invoice_text: "[]".into(),
            total,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let s = supplier(Some("CZ6508000000192000145399"));
        assert!(has_required_payment_info(&s, &invoice(100.0), "CZK"));
        assert!(!has_required_payment_info(&s, &invoice(0.0), "CZK"));
        assert!(!has_required_payment_info(&s, &invoice(100.0), ""));
        assert!(!has_required_payment_info(&supplier(None), &invoice(100.0), "CZK"));
        assert!(!has_required_payment_info(&supplier(Some("  ")), &invoice(100.0), "CZK"));
    }
}
