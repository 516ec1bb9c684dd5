use chrono::NaiveDate;

use crate::error::{LucidError, MalformedRow, Result};
use crate::models::{RawRecord, StatementFormat};

// ---------------------------------------------------------------------------
// Locale helpers
// ---------------------------------------------------------------------------

/// Parse a statement amount into signed cents.
///
/// Accepts decimal comma or point, `'`/`.`/`,`/space thousands separators,
/// a leading or trailing sign, parenthesized negatives and a currency code or
/// symbol on either side. Returns `None` for anything else.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\'' | '"' | '\u{2019}'))
        .collect();
    let mut s = compact.as_str();
    let mut negative = false;

    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner;
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    s = s.trim_matches(|c: char| c.is_alphabetic() || matches!(c, '$' | '€' | '£'));
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest;
    } else if let Some(rest) = s.strip_suffix('-') {
        negative = !negative;
        s = rest;
    }
    if s.is_empty() {
        return None;
    }

    let (int_part, frac_part) = split_decimal(s)?;
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac_part.len() > 2 {
        return None;
    }

    let units: i64 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let cents: i64 = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<i64>().ok()? * 10,
        _ => frac_part.parse().ok()?,
    };
    let total = units.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -total } else { total })
}

/// Split into (integer digits, fraction digits) with thousands separators
/// removed from the integer part.
fn split_decimal(s: &str) -> Option<(String, String)> {
    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');
    let decimal_at = match (last_comma, last_dot) {
        (Some(c), Some(d)) => Some(c.max(d)),
        (Some(i), None) | (None, Some(i)) => {
            let sep = &s[i..i + 1];
            let digits_after = s.len() - i - 1;
            if s.matches(sep).count() == 1 && digits_after <= 2 {
                Some(i)
            } else {
                None
            }
        }
        (None, None) => None,
    };
    match decimal_at {
        Some(i) => {
            let int_part: String = s[..i].chars().filter(|c| *c != ',' && *c != '.').collect();
            Some((int_part, s[i + 1..].to_string()))
        }
        None => {
            let int_part: String = s.chars().filter(|c| *c != ',' && *c != '.').collect();
            Some((int_part, String::new()))
        }
    }
}

/// Day-first dates as exported by the issuing institutions, plus ISO.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// UTF-8 when valid, otherwise Latin-1 (card invoices are exported that way).
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim().to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect::<String>().trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Column layouts
// ---------------------------------------------------------------------------

const BANK_REQUIRED: &[&str] = &["trade date", "debit", "credit", "description1"];
const CARD_REQUIRED: &[&str] = &["purchase date", "booking text", "sector", "amount"];

fn required_columns(format: StatementFormat) -> &'static [&'static str] {
    match format {
        StatementFormat::BankStatement => BANK_REQUIRED,
        StatementFormat::CardInvoice => CARD_REQUIRED,
    }
}

#[derive(Debug)]
struct Columns {
    date: usize,
    descriptions: Vec<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
    amount: Option<usize>,
    sector: Option<usize>,
    sub_type: Option<usize>,
}

impl Columns {
    fn locate(format: StatementFormat, header: &[String]) -> Option<Self> {
        let find = |name: &str| header.iter().position(|h| h == name);
        if !required_columns(format).iter().all(|c| find(c).is_some()) {
            return None;
        }
        let columns = match format {
            StatementFormat::BankStatement => Columns {
                date: find("trade date")?,
                descriptions: ["description1", "description2", "description3"]
                    .iter()
                    .filter_map(|c| find(c))
                    .collect(),
                debit: find("debit"),
                credit: find("credit"),
                amount: None,
                sector: None,
                sub_type: find("sub type"),
            },
            StatementFormat::CardInvoice => Columns {
                date: find("purchase date")?,
                descriptions: vec![find("booking text")?],
                debit: find("debit"),
                credit: find("credit"),
                amount: find("amount"),
                sector: find("sector"),
                sub_type: find("sub type"),
            },
        };
        Some(columns)
    }
}

fn normalize_header(record: &csv::ByteRecord) -> Vec<String> {
    record.iter().map(|f| decode_field(f).to_lowercase()).collect()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Lazily parsed statement rows. Each item is either a record or the row
/// that could not be parsed; iteration continues past bad rows.
pub struct Records<'a> {
    rows: csv::ByteRecordsIntoIter<&'a [u8]>,
    format: StatementFormat,
    columns: Columns,
}

pub fn extract(bytes: &[u8], format: StatementFormat) -> Result<Records<'_>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut rows = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes)
        .into_byte_records();

    let other = match format {
        StatementFormat::BankStatement => StatementFormat::CardInvoice,
        StatementFormat::CardInvoice => StatementFormat::BankStatement,
    };

    while let Some(result) = rows.next() {
        let record = result?;
        let header = normalize_header(&record);
        if let Some(columns) = Columns::locate(format, &header) {
            return Ok(Records { rows, format, columns });
        }
        if Columns::locate(other, &header).is_some() {
            return Err(LucidError::SchemaMismatch {
                format: format.name().to_string(),
                detail: format!("header matches the {} layout", other.name()),
            });
        }
    }

    Err(LucidError::SchemaMismatch {
        format: format.name().to_string(),
        detail: format!("no header row with columns: {}", required_columns(format).join(", ")),
    })
}

/// Everything parsed from one file, good rows and bad.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    pub errors: Vec<MalformedRow>,
}

pub fn extract_all(bytes: &[u8], format: StatementFormat) -> Result<Extraction> {
    let mut extraction = Extraction::default();
    for item in extract(bytes, format)? {
        match item {
            Ok(record) => extraction.records.push(record),
            Err(row) => extraction.errors.push(row),
        }
    }
    Ok(extraction)
}

impl Iterator for Records<'_> {
    type Item = std::result::Result<RawRecord, MalformedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.rows.next()? {
                Ok(record) => record,
                Err(e) => {
                    return Some(Err(MalformedRow {
                        line: e.position().map(|p| p.line()).unwrap_or(0),
                        reason: e.to_string(),
                    }))
                }
            };
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            match self.parse_row(&record) {
                Ok(Some(raw)) => return Some(Ok(raw)),
                Ok(None) => continue,
                Err(reason) => return Some(Err(MalformedRow { line, reason })),
            }
        }
    }
}

impl Records<'_> {
    fn field(&self, record: &csv::ByteRecord, idx: Option<usize>) -> Option<String> {
        idx.and_then(|i| record.get(i))
            .map(decode_field)
            .filter(|s| !s.is_empty())
    }

    fn amount_cell(&self, record: &csv::ByteRecord, idx: Option<usize>, name: &str) -> std::result::Result<Option<i64>, String> {
        match self.field(record, idx) {
            None => Ok(None),
            Some(cell) => parse_amount(&cell)
                .map(Some)
                .ok_or_else(|| format!("unparseable {name} amount '{cell}'")),
        }
    }

    /// `Ok(None)` for lines that carry no transaction (footers, blank lines,
    /// zero-amount card rows).
    fn parse_row(&self, record: &csv::ByteRecord) -> std::result::Result<Option<RawRecord>, String> {
        if record.iter().all(|f| decode_field(f).is_empty()) {
            return Ok(None);
        }
        let Some(date_cell) = self.field(record, Some(self.columns.date)) else {
            return Ok(None);
        };
        let date = parse_date(&date_cell).ok_or_else(|| format!("unparseable date '{date_cell}'"))?;
        let sub_type_hint = self.field(record, self.columns.sub_type);

        match self.format {
            StatementFormat::BankStatement => {
                let description = self
                    .columns
                    .descriptions
                    .iter()
                    .filter_map(|&i| self.field(record, Some(i)))
                    .collect::<Vec<_>>()
                    .join(" | ");
                if description.is_empty() {
                    return Err("missing description".to_string());
                }
                let credit = self.amount_cell(record, self.columns.credit, "credit")?;
                let debit = self.amount_cell(record, self.columns.debit, "debit")?;
                let amount = match (credit, debit) {
                    (Some(c), _) if c != 0 => c.abs(),
                    (_, Some(d)) if d != 0 => -d.abs(),
                    _ => return Err("missing debit/credit amount".to_string()),
                };
                Ok(Some(RawRecord {
                    date,
                    description,
                    amount,
                    source: self.format,
                    merchant_category: None,
                    sub_type_hint,
                }))
            }
            StatementFormat::CardInvoice => {
                let sector = self.field(record, self.columns.sector);
                let booking = self.field(record, self.columns.descriptions.first().copied());
                let description = format!(
                    "{} - {}",
                    sector.as_deref().unwrap_or(""),
                    booking.as_deref().unwrap_or("")
                )
                .trim_matches(|c: char| c == ' ' || c == '-')
                .to_string();
                if description.is_empty() {
                    return Err("missing booking text".to_string());
                }
                let credit = self.amount_cell(record, self.columns.credit, "credit")?;
                let amount = match credit {
                    Some(c) if c != 0 => c.abs(),
                    _ => {
                        let charged = match self.amount_cell(record, self.columns.amount, "card")? {
                            Some(a) => a,
                            None => self
                                .amount_cell(record, self.columns.debit, "debit")?
                                .ok_or_else(|| "missing amount".to_string())?,
                        };
                        -charged.abs()
                    }
                };
                if amount == 0 {
                    return Ok(None);
                }
                Ok(Some(RawRecord {
                    date,
                    description,
                    amount,
                    source: self.format,
                    merchant_category: sector,
                    sub_type_hint,
                }))
            }
        }
    }
}

#[cfg(test)]
pub(crate) const BANK_SAMPLE: &str = "\
Account number:;0240 00123456.01;
IBAN:;CH12 0024 0240 1234 5601 A;
From:;2025-01-01;
Until:;2025-01-31;

Trade date;Trade time;Booking date;Value date;Currency;Debit;Credit;Individual amount;Balance;Transaction no.;Description1;Description2;Description3;Footnotes
03.01.2025;;03.01.2025;03.01.2025;CHF;-1'850,00;;;;9930;Pilet + Renaud SA;Rent January;;
15.01.2025;;15.01.2025;15.01.2025;CHF;;5'200,50;;;9931;Webloyalty Sarl;;Salaire janvier;
17.01.2025;;17.01.2025;17.01.2025;CHF;-42,35;;;;9932;Migros Genève;Debit card;;
;;;;;;;;12'345,67;;;;;
";

#[cfg(test)]
pub(crate) const CARD_SAMPLE: &str = "\
sep=;
Account number;Card number;Account/Cardholder;Purchase date;Booking text;Sector;Amount;Original currency;Rate;Currency;Debit;Credit;Booked
1234;5500 **** **** 1234;JANE DOE;05.01.2025;Coop-1234 Geneve;Grocery stores;54.20;CHF;;CHF;54.20;;06.01.2025
1234;5500 **** **** 1234;JANE DOE;07.01.2025;Netflix.com;Digital goods;15.90;CHF;;CHF;15.90;;08.01.2025
1234;5500 **** **** 1234;JANE DOE;20.01.2025;Votre paiement QR;;;;;;;300.00;20.01.2025
";
