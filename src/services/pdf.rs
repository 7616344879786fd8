//! Invoice PDF rendering via printpdf. A4 pages, embedded DejaVu Sans (the
//! builtin Type1 fonts are WinAnsi-only and cannot carry Czech diacritics),
//! labels localized to the invoice's locale (not the session's).

use printpdf::{IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

static FONT_REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static FONT_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

use crate::errors::AppError;
use crate::i18n::t;
use crate::structs::{Client, Invoice, LineItem, Supplier};

pub struct InvoicePdf<'a> {
    pub invoice: &'a Invoice,
    pub supplier: &'a Supplier,
    pub client: &'a Client,
    pub items: &'a [LineItem],
    pub currency_code: &'a str,
    pub payment_method: &'a str,
    pub locale: &'a str,
}

/// Two decimals, thin thousands separators: `12 345.67`.
pub fn format_money(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, dec_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let int_with_sep: String = grouped.chars().rev().collect();
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, int_with_sep, dec_part)
}

fn push_line(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x: f32,
    y: f32,
) {
    layer.use_text(text, font_size, Mm(x), Mm(y), font);
}

fn divider(layer: &PdfLayerReference, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(15.0), Mm(y)), false),
            (Point::new(Mm(195.0), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn address_lines(street: &Option<String>, city: &Option<String>, zip: &Option<String>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(street) = street.as_deref().filter(|s| !s.is_empty()) {
        lines.push(street.to_string());
    }
    let place = match (zip.as_deref(), city.as_deref()) {
        (Some(zip), Some(city)) => format!("{} {}", zip, city),
        (None, Some(city)) => city.to_string(),
        (Some(zip), None) => zip.to_string(),
        (None, None) => String::new(),
    };
    if !place.trim().is_empty() {
        lines.push(place);
    }
    lines
}

pub fn render(data: &InvoicePdf) -> Result<Vec<u8>, AppError> {
    let lang = data.locale;
    let title = format!("{} {}", t(lang, "invoice"), data.invoice.number);
    let (doc, page1, layer1) = PdfDocument::new(title.as_str(), Mm(210.0), Mm(297.0), "Layer 1");
    let mut layer = doc.get_page(page1).get_layer(layer1);

    let font = doc
        .add_external_font(FONT_REGULAR)
        .map_err(|e| AppError::Pdf(e.to_string()))?;
    let font_bold = doc
        .add_external_font(FONT_BOLD)
        .map_err(|e| AppError::Pdf(e.to_string()))?;

    // Supplier block (left), title and number (right).
    let mut y: f32 = 285.0;
    push_line(&layer, &font_bold, &data.supplier.name, 16.0, 15.0, y);
    push_line(&layer, &font_bold, &t(lang, "invoice").to_uppercase(), 24.0, 140.0, y);
    push_line(&layer, &font_bold, &data.invoice.number, 12.0, 140.0, 277.0);
    y -= 7.0;
    for line in address_lines(&data.supplier.street, &data.supplier.city, &data.supplier.zip) {
        push_line(&layer, &font, &line, 10.0, 15.0, y);
        y -= 5.0;
    }
    if let Some(ico) = data.supplier.ico.as_deref().filter(|s| !s.is_empty()) {
        push_line(&layer, &font, &format!("{}: {}", t(lang, "ico"), ico), 10.0, 15.0, y);
        y -= 5.0;
    }
    if let Some(dic) = data.supplier.dic.as_deref().filter(|s| !s.is_empty()) {
        push_line(&layer, &font, &format!("{}: {}", t(lang, "dic"), dic), 10.0, 15.0, y);
        y -= 5.0;
    }
    if let Some(iban) = data.supplier.iban.as_deref().filter(|s| !s.is_empty()) {
        push_line(
            &layer,
            &font,
            &format!("{}: {}", t(lang, "bank_account"), iban),
            10.0,
            15.0,
            y,
        );
    }

    y = 252.0;
    divider(&layer, y);

    // Client block and invoice details.
    y -= 10.0;
    push_line(&layer, &font_bold, &format!("{}:", t(lang, "client")), 12.0, 15.0, y);
    y -= 7.0;
    push_line(&layer, &font, &data.client.name, 10.0, 15.0, y);
    let mut detail_y = y;
    y -= 5.0;
    for line in address_lines(&data.client.street, &data.client.city, &data.client.zip) {
        push_line(&layer, &font, &line, 10.0, 15.0, y);
        y -= 5.0;
    }
    if let Some(ico) = data.client.ico.as_deref().filter(|s| !s.is_empty()) {
        push_line(&layer, &font, &format!("{}: {}", t(lang, "ico"), ico), 10.0, 15.0, y);
        y -= 5.0;
    }

    let mut detail = |label: &str, value: &str| {
        push_line(&layer, &font, &format!("{}: {}", label, value), 10.0, 120.0, detail_y);
        detail_y -= 5.0;
    };
    detail(t(lang, "issue_date"), &data.invoice.issued_on);
    detail(t(lang, "due_date"), &data.invoice.due_on);
    if let Some(taxable) = data.invoice.taxable_supply_on.as_deref().filter(|s| !s.is_empty()) {
        detail(t(lang, "taxable_date"), taxable);
    }
    if let Some(vs) = data.invoice.variable_symbol.as_deref().filter(|s| !s.is_empty()) {
        detail(t(lang, "variable_symbol"), vs);
    }
    detail(t(lang, "payment_method"), data.payment_method);
    detail(t(lang, "currency"), data.currency_code);

    y = y.min(detail_y) - 10.0;

    // Items table.
    let x_name = 15.0;
    let x_qty = 110.0;
    let x_unit = 130.0;
    let x_price = 145.0;
    let x_total = 175.0;

    let table_header = |layer: &PdfLayerReference, mut y: f32| -> f32 {
        push_line(layer, &font_bold, t(lang, "item"), 10.0, x_name, y);
        push_line(layer, &font_bold, t(lang, "quantity"), 10.0, x_qty, y);
        push_line(layer, &font_bold, t(lang, "unit"), 10.0, x_unit, y);
        push_line(layer, &font_bold, t(lang, "unit_price"), 10.0, x_price, y);
        push_line(layer, &font_bold, t(lang, "total"), 10.0, x_total, y);
        y -= 3.5;
        divider(layer, y);
        y - 7.0
    };

    y = table_header(&layer, y);

    for (idx, item) in data.items.iter().enumerate() {
        // Long tables flow onto continuation pages.
        if y < 25.0 {
            let (page, next_layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            layer = doc.get_page(page).get_layer(next_layer);
            y = table_header(&layer, 285.0);
        }
        let row_total = item.price * item.quantity * (1.0 + item.tax_rate / 100.0);
        push_line(&layer, &font, &format!("{}. {}", idx + 1, item.name), 10.0, x_name, y);
        push_line(&layer, &font, &format!("{:.2}", item.quantity), 10.0, x_qty, y);
        push_line(&layer, &font, item.unit.as_deref().unwrap_or(""), 10.0, x_unit, y);
        push_line(&layer, &font, &format_money(item.price), 10.0, x_price, y);
        push_line(&layer, &font, &format_money(row_total), 10.0, x_total, y);
        y -= 6.0;
    }

    // The summary block needs room for the tax lines and the total.
    if y < 60.0 {
        let (page, next_layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
        layer = doc.get_page(page).get_layer(next_layer);
        y = 285.0;
    }

    y -= 2.0;
    divider(&layer, y);
    y -= 10.0;

    // Tax summary per rate, then the grand total.
    for (rate, base, tax) in tax_summary(data.items) {
        push_line(
            &layer,
            &font,
            &format!("{} {:.0} % ({}):", t(lang, "tax"), rate, format_money(base)),
            10.0,
            120.0,
            y,
        );
        push_line(&layer, &font, &format_money(tax), 10.0, x_total, y);
        y -= 6.0;
    }

    y -= 4.0;
    push_line(&layer, &font_bold, &format!("{}:", t(lang, "total_due")), 13.0, 120.0, y);
    push_line(
        &layer,
        &font_bold,
        &format!("{} {}", format_money(data.invoice.total), data.currency_code),
        13.0,
        x_total,
        y,
    );

    if let Some(message) = data.invoice.message.as_deref().filter(|m| !m.trim().is_empty()) {
        y -= 14.0;
        for line in message.lines() {
            if y < 15.0 {
                break;
            }
            push_line(&layer, &font, line, 9.0, 15.0, y);
            y -= 5.0;
        }
    }

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(|e| AppError::Pdf(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| AppError::Pdf(e.to_string()))
}

/// Groups line items by tax rate: (rate, base, tax amount), ordered by rate.
pub fn tax_summary(items: &[LineItem]) -> Vec<(f64, f64, f64)> {
    let mut rates: Vec<f64> = Vec::new();
    for item in items {
        if !rates.iter().any(|r| (r - item.tax_rate).abs() < 1e-9) {
            rates.push(item.tax_rate);
        }
    }
    rates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    rates
        .into_iter()
        .map(|rate| {
            let base: f64 = items
                .iter()
                .filter(|i| (i.tax_rate - rate).abs() < 1e-9)
                .map(|i| i.price * i.quantity)
                .sum();
            (rate, base, base * rate / 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Invoice, Supplier, Client, Vec<LineItem>) {
        let invoice = Invoice {
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
            taxable_supply_on: Some("2026-01-10".into()),
            variable_symbol: Some("20260001".into()),
            constant_symbol: None,
            specific_symbol: None,
            message: Some("Thank you for your business.".into()),
            invoice_text: "[]".into(),
            total: 3630.0,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let supplier = Supplier {
            id: 1,
            user_id: 1,
            name: "ACME s.r.o.".into(),
            ico: Some("25596641".into()),
            dic: Some("CZ25596641".into()),
            street: Some("Dlouhá 12".into()),
            city: Some("Praha".into()),
            zip: Some("110 00".into()),
            country_id: None,
            email: None,
            phone: None,
            account_number: None,
            iban: Some("CZ6508000000192000145399".into()),
            swift: Some("GIBACZPX".into()),
            bank_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let client = Client {
            id: 1,
            user_id: 1,
            name: "Novák a syn".into(),
            ico: Some("00006947".into()),
            dic: None,
            street: Some("Krátká 3".into()),
            city: Some("Brno".into()),
            zip: Some("602 00".into()),
            country_id: None,
            email: None,
            phone: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let items = vec![LineItem {
            name: "Consulting".into(),
            quantity: 2.0,
            unit: Some("h".into()),
            price: 1500.0,
            tax_rate: 21.0,
        }];
        (invoice, supplier, client, items)
    }

    #[test]
    fn renders_pdf_bytes() {
        let (invoice, supplier, client, items) = sample();
        let bytes = render(&InvoicePdf {
            invoice: &invoice,
            supplier: &supplier,
            client: &client,
            items: &items,
            currency_code: "CZK",
            payment_method: "bank_transfer",
            locale: "cs",
        })
        .unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn long_item_table_flows_to_more_pages() {
        let (invoice, supplier, client, _) = sample();
        let items: Vec<LineItem> = (1..=60)
            .map(|i| LineItem {
                name: format!("Work package {}", i),
                quantity: 1.0,
                unit: Some("ks".into()),
                price: 100.0,
                tax_rate: 21.0,
            })
            .collect();
        let short_items = vec![items[0].clone()];
        let pdf = |items: &[LineItem]| {
            render(&InvoicePdf {
                invoice: &invoice,
                supplier: &supplier,
                client: &client,
                items,
                currency_code: "CZK",
                payment_method: "bank_transfer",
                locale: "en",
            })
            .unwrap()
        };
        let long = pdf(&items);
        assert_eq!(&long[..5], b"%PDF-");

        let page_count =
            |bytes: &[u8]| String::from_utf8_lossy(bytes).matches("/Type/Page").count();
        assert!(page_count(&long) > page_count(&pdf(&short_items)));
    }

    #[test]
    fn czech_labels_survive_font_encoding() {
        // Diacritic labels depend on the embedded font; the builtin Type1
        // set would drop these glyphs.
        let (invoice, supplier, client, items) = sample();
        let bytes = render(&InvoicePdf {
            invoice: &invoice,
            supplier: &supplier,
            client: &client,
            items: &items,
            currency_code: "CZK",
            payment_method: "bank_transfer",
            locale: "cs",
        })
        .unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn money_grouping() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(1234.5), "1 234.50");
        assert_eq!(format_money(-1234567.891), "-1 234 567.89");
    }

    #[test]
    fn tax_summary_groups_by_rate() {
        let item = |price: f64, rate: f64| LineItem {
            name: "x".into(),
            quantity: 1.0,
            unit: None,
            price,
            tax_rate: rate,
        };
        let summary = tax_summary(&[item(100.0, 21.0), item(200.0, 21.0), item(50.0, 0.0)]);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].0, 0.0);
        assert_eq!(summary[1].0, 21.0);
        assert!((summary[1].1 - 300.0).abs() < 1e-9);
        assert!((summary[1].2 - 63.0).abs() < 1e-9);
    }
}

