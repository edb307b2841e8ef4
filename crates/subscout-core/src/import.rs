//! Statement import
//!
//! Reads delimited bank exports into [`StatementRecord`]s. The layout is
//! always chosen explicitly; there is no sniffing of headers.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::StatementRecord;

const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y", // 15/01/2024
    "%d-%m-%Y", // 15-01-2024
    "%Y-%m-%d", // 2024-01-15
];

// %y before %Y: %Y would read "24" as the year 24
const MONTH_FIRST_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-01-15
    "%m/%d/%y", // 01/15/24
    "%m/%d/%Y", // 01/15/2024
];

/// Column layout of a delimited statement export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFormat {
    pub delimiter: u8,
    /// Zero-based line holding the column names; earlier lines are preamble
    pub header_row: usize,
    pub date_column: String,
    pub description_column: String,
    pub amount_column: String,
    /// `1.234,56` instead of `1,234.56`
    pub decimal_comma: bool,
    /// `15/01/2024` instead of `01/15/2024`
    pub day_first: bool,
}

impl StatementFormat {
    /// Spanish bank export: seven preamble lines, `;`-separated, decimal comma
    pub fn spanish_bank() -> Self {
        Self {
            delimiter: b';',
            header_row: 7,
            date_column: "FECHA OPERACIÓN".to_string(),
            description_column: "CONCEPTO".to_string(),
            amount_column: "IMPORTE EUR".to_string(),
            decimal_comma: true,
            day_first: true,
        }
    }

    /// Plain `Date,Description,Amount` CSV
    pub fn simple() -> Self {
        Self {
            delimiter: b',',
            header_row: 0,
            date_column: "Date".to_string(),
            description_column: "Description".to_string(),
            amount_column: "Amount".to_string(),
            decimal_comma: false,
            day_first: false,
        }
    }
}

impl FromStr for StatementFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spanish" | "spanish-bank" => Ok(Self::spanish_bank()),
            "simple" => Ok(Self::simple()),
            _ => Err(format!("Unknown statement layout: {}", s)),
        }
    }
}

/// Records read from a statement, plus the rows that could not be used
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStatement {
    pub records: Vec<StatementRecord>,
    /// Rows whose date or amount did not parse
    pub dropped: usize,
}

/// Parse a delimited statement export
pub fn parse_statement<R: Read>(mut reader: R, format: &StatementFormat) -> Result<ParsedStatement> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    // Bank exports are not always UTF-8; keep going with replacement characters
    let text = String::from_utf8_lossy(&bytes);
    let body = skip_lines(&text, format.header_row);

    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = rdr.headers()?.clone();
    let date_idx = column_index(&headers, &format.date_column)?;
    let desc_idx = column_index(&headers, &format.description_column)?;
    let amount_idx = column_index(&headers, &format.amount_column)?;

    let mut parsed = ParsedStatement::default();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;

        let date = record
            .get(date_idx)
            .and_then(|s| parse_date(s, format.day_first));
        let amount = record
            .get(amount_idx)
            .and_then(|s| parse_amount(s, format.decimal_comma));

        match (date, amount) {
            (Some(date), Some(amount)) => {
                let description = record.get(desc_idx).unwrap_or_default().trim();
                parsed
                    .records
                    .push(StatementRecord::new(date, description, amount));
            }
            _ => {
                debug!("Dropping row {}: unparseable date or amount ({:?})", row + 1, record);
                parsed.dropped += 1;
            }
        }
    }

    info!(
        "Imported {} rows ({} dropped)",
        parsed.records.len(),
        parsed.dropped
    );

    Ok(parsed)
}

/// Parse a JSON array of statement records
pub fn parse_records_json<R: Read>(reader: R) -> Result<Vec<StatementRecord>> {
    let records: Vec<StatementRecord> = serde_json::from_reader(reader)?;
    debug!("Read {} JSON records", records.len());
    Ok(records)
}

/// Everything after the first `n` lines
fn skip_lines(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

/// Find a column by name (trimmed, case-insensitive)
fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    let wanted = name.trim().to_lowercase();
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase() == wanted)
        .ok_or_else(|| {
            Error::Import(format!(
                "Missing column '{}' (found: {})",
                name,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })
}

/// Parse a date with the layout's ordered format list
pub fn parse_date(s: &str, day_first: bool) -> Option<NaiveDate> {
    let s = s.trim();
    let formats = if day_first {
        DAY_FIRST_FORMATS
    } else {
        MONTH_FIRST_FORMATS
    };

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse an amount, rounded to cents.
///
/// Currency symbols, spaces and thousands separators are ignored;
/// `(12.50)` is negative.
pub fn parse_amount(s: &str, decimal_comma: bool) -> Option<Decimal> {
    let s = s.trim();
    let negative = s.starts_with('(') && s.ends_with(')');

    // Anything else, thousands separators included, is dropped
    let decimal = if decimal_comma { ',' } else { '.' };
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '+' || *c == decimal)
        .map(|c| if c == decimal { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let value = Decimal::from_str(&cleaned).ok()?;
    let value = if negative { -value.abs() } else { value };
    Some(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("15/01/2024", true), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("15-01-2024", true), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15", true), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("01/15/2024", false), Some(d(2024, 1, 15)));
        assert_eq!(parse_date("01/15/24", false), Some(d(2024, 1, 15)));
        // 03/04 is April 3rd day-first, March 4th otherwise
        assert_eq!(parse_date("03/04/2024", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("03/04/2024", false), Some(d(2024, 3, 4)));
        assert_eq!(parse_date("yesterday", false), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56", false), Some(dec("1234.56")));
        assert_eq!(parse_amount("-123.45", false), Some(dec("-123.45")));
        assert_eq!(parse_amount("(100.00)", false), Some(dec("-100.00")));
        assert_eq!(parse_amount("-1.234,56 €", true), Some(dec("-1234.56")));
        assert_eq!(parse_amount("-12,99", true), Some(dec("-12.99")));
        assert_eq!(parse_amount("0.125", false), Some(dec("0.13")));
        assert_eq!(parse_amount("", false), None);
        assert_eq!(parse_amount("n/a", false), None);
    }

    #[test]
    fn test_parse_spanish_bank() {
        let csv = "\
Cuenta;ES00 0000 0000 0000 0000 0000
Titular;JUAN PEREZ
Periodo;01/01/2024 - 31/03/2024
Divisa;EUR

Movimientos
Exportado;31/03/2024
FECHA OPERACIÓN;FECHA VALOR;CONCEPTO;IMPORTE EUR;SALDO
05/01/2024;05/01/2024;RECIBO NETFLIX.COM;-12,99;1.987,01
28/01/2024;28/01/2024;NOMINA ACME SL;2.100,00;4.087,01
05/02/2024;05/02/2024;RECIBO NETFLIX.COM;-12,99;4.074,02
;;PENDIENTE;;
";

        let parsed = parse_statement(csv.as_bytes(), &StatementFormat::spanish_bank()).unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.dropped, 1);

        let first = &parsed.records[0];
        assert_eq!(first.date, Some(d(2024, 1, 5)));
        assert_eq!(first.description.as_deref(), Some("RECIBO NETFLIX.COM"));
        assert_eq!(first.amount, Some(dec("-12.99")));
        assert_eq!(parsed.records[1].amount, Some(dec("2100.00")));
    }

    #[test]
    fn test_parse_simple() {
        let csv = "Date,Description,Amount\n\
                   2024-01-15,NETFLIX.COM,-15.99\n\
                   01/16/2024,\"STARBUCKS, MAIN ST\",-5.50\n\
                   not a date,BROKEN,-1.00\n";

        let parsed = parse_statement(csv.as_bytes(), &StatementFormat::simple()).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.dropped, 1);
        assert_eq!(
            parsed.records[1].description.as_deref(),
            Some("STARBUCKS, MAIN ST")
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let csv = " date ,DESCRIPTION,amount\n2024-01-15,X,-1.00\n";
        let parsed = parse_statement(csv.as_bytes(), &StatementFormat::simple()).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_missing_column_is_import_error() {
        let csv = "Date,Memo,Amount\n2024-01-15,X,-1.00\n";
        let err = parse_statement(csv.as_bytes(), &StatementFormat::simple()).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
        assert!(err.to_string().contains("Description"));
    }

    #[test]
    fn test_header_beyond_input_is_import_error() {
        let csv = "only one line";
        let result = parse_statement(csv.as_bytes(), &StatementFormat::spanish_bank());
        assert!(matches!(result, Err(Error::Import(_))));
    }

    #[test]
    fn test_parse_records_json() {
        let json = r#"[
            {"date": "2024-01-05", "description": "NETFLIX", "amount": "-12.99"},
            {"date": null, "description": "PENDING", "amount": "-3.00"},
            {"date": "2024-01-06", "amount": -4.5}
        ]"#;

        let records = parse_records_json(json.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].amount, Some(dec("-12.99")));
        assert!(records[1].date.is_none());
        assert!(records[2].description.is_none());
        assert_eq!(records[2].amount, Some(dec("-4.5")));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(
            "Spanish".parse::<StatementFormat>().unwrap(),
            StatementFormat::spanish_bank()
        );
        assert_eq!(
            "simple".parse::<StatementFormat>().unwrap(),
            StatementFormat::simple()
        );
        assert!("ofx".parse::<StatementFormat>().is_err());
    }
}
