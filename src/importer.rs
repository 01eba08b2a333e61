use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{BizError, Result};
use crate::models::Transaction;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a statement amount: thousands separators, `$`, quotes and
/// parenthesized negatives are accepted.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    let value = if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        -inner.trim().parse::<f64>().ok()?
    } else if let Some(rest) = s.strip_prefix("-") {
        -rest.trim().parse::<f64>().ok()?
    } else {
        s.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d %b %Y", "%Y/%m/%d"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Complete a `<day> <month-abbrev>` statement date with the configured year.
pub fn complete_date(day_month: &str, year: i32) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{} {year}", day_month.trim()), "%d %b %Y").ok()
}

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    Csv,
    Pdf,
}

impl StatementFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn detect(file_path: &Path) -> Option<Self> {
        file_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_key)
    }
}

/// Parse a statement file into canonical transactions.
pub fn parse_statement(
    file_path: &Path,
    format: Option<StatementFormat>,
    year: i32,
) -> Result<Vec<Transaction>> {
    let format = match format {
        Some(f) => f,
        None => StatementFormat::detect(file_path).ok_or_else(|| {
            BizError::UnknownFormat(file_path.display().to_string())
        })?,
    };
    tracing::debug!(format = format.key(), "parsing {}", file_path.display());
    match format {
        StatementFormat::Csv => {
            let file = std::fs::File::open(file_path)?;
            parse_csv(std::io::BufReader::new(file))
        }
        StatementFormat::Pdf => parse_pdf_file(file_path, year),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

const REQUIRED_COLUMNS: [&str; 3] = ["date", "description", "amount"];

/// Parse a CSV table whose header names `date`, `description` and `amount`
/// (any case, surrounding whitespace ignored). Other columns are ignored.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(idx_date), Some(idx_desc), Some(idx_amount)) =
        (column("date"), column("description"), column("amount"))
    else {
        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|c| column(*c).is_none())
            .map(|c| c.to_string())
            .collect();
        return Err(BizError::MissingColumns(missing));
    };

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = i + 2;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let date = parse_date(field(idx_date))
            .ok_or_else(|| BizError::Parse(format!("row {line}: invalid date '{}'", field(idx_date))))?;
        let description = field(idx_desc).to_string();
        if description.is_empty() {
            return Err(BizError::Parse(format!("row {line}: empty description")));
        }
        let amount = parse_amount(field(idx_amount))
            .ok_or_else(|| BizError::Parse(format!("row {line}: invalid amount '{}'", field(idx_amount))))?;
        rows.push(Transaction {
            date,
            description,
            amount,
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

// <day> <mon>  <description>  <withdrawal?>  <deposit?>
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2} \w{3})\s+(.+?)\s+((?:[\d,]+\.\d{2})?)\s+((?:[\d,]+\.\d{2})?)$")
            .expect("statement line pattern is valid")
    })
}

// <day> <mon>  <description>  <amount>
fn single_amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2} \w{3})\s+(.+?)\s+([\d,]+\.\d{2})$")
            .expect("single amount pattern is valid")
    })
}

fn non_empty<'h>(m: Option<regex::Match<'h>>) -> Option<&'h str> {
    m.map(|m| m.as_str()).filter(|s| !s.is_empty())
}

/// Match one extracted text line. `None` for anything that is not a
/// transaction: headers, footers, balance lines without amounts, or dates
/// that do not exist in `year`.
///
/// Trailing whitespace is ignored. A wide gap before a lone amount marks
/// it as a deposit; otherwise the first amount is the withdrawal.
pub fn parse_statement_line(line: &str, year: i32) -> Option<Transaction> {
    let line = line.trim_end();
    let (raw_date, description, withdrawal, deposit) = match line_pattern().captures(line) {
        Some(caps) => (
            caps.get(1)?.as_str(),
            caps.get(2)?.as_str().trim(),
            non_empty(caps.get(3)),
            non_empty(caps.get(4)),
        ),
        None => {
            let caps = single_amount_pattern().captures(line)?;
            (
                caps.get(1)?.as_str(),
                caps.get(2)?.as_str().trim(),
                non_empty(caps.get(3)),
                None,
            )
        }
    };

    let amount = match (withdrawal, deposit) {
        (Some(w), _) => -parse_amount(w)?,
        (None, Some(d)) => parse_amount(d)?,
        (None, None) => return None,
    };
    let Some(date) = complete_date(raw_date, year) else {
        tracing::debug!("skipping line with invalid date '{raw_date}'");
        return None;
    };
    Some(Transaction {
        date,
        description: description.to_string(),
        amount,
    })
}

/// Parse page texts in page order, line by line, keeping source order.
pub fn parse_pdf_pages<S: AsRef<str>>(pages: &[S], year: i32) -> Vec<Transaction> {
    pages
        .iter()
        .flat_map(|page| page.as_ref().lines())
        .filter_map(|line| parse_statement_line(line, year))
        .collect()
}

/// Split extracted document text into pages on form feeds.
pub fn split_pages(text: &str) -> Vec<&str> {
    text.split('\u{000C}').collect()
}

#[cfg(feature = "pdf")]
pub fn extract_pdf_pages(file_path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(file_path)?;
    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| BizError::Pdf(format!("{}: {e}", file_path.display())))?;
    Ok(split_pages(&text).into_iter().map(str::to_string).collect())
}

#[cfg(feature = "pdf")]
pub fn parse_pdf_file(file_path: &Path, year: i32) -> Result<Vec<Transaction>> {
    let pages = extract_pdf_pages(file_path)?;
    let txns = parse_pdf_pages(&pages, year);
    tracing::debug!(pages = pages.len(), transactions = txns.len(), "parsed PDF statement");
    Ok(txns)
}

#[cfg(not(feature = "pdf"))]
pub fn parse_pdf_file(file_path: &Path, _year: i32) -> Result<Vec<Transaction>> {
    Err(BizError::UnknownFormat(format!(
        "{}: PDF support was not compiled in (enable the `pdf` feature)",
        file_path.display()
    )))
}

/// Write transactions as a canonical `date,description,amount` CSV.
pub fn write_transactions_csv<W: std::io::Write>(writer: W, txns: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(REQUIRED_COLUMNS)?;
    for t in txns {
        wtr.write_record([
            t.date.format("%Y-%m-%d").to_string(),
            t.description.clone(),
            format!("{:.2}", t.amount),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("\"500.00\""), Some(500.0));
        assert_eq!(parse_amount("  -42.50  "), Some(-42.5));
        assert_eq!(parse_amount("(1,234.56)"), Some(-1234.56));
        assert_eq!(parse_amount("-$50.00"), Some(-50.0));
        assert_eq!(parse_amount("not_a_number"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-01-05"), Some(ymd(2025, 1, 5)));
        assert_eq!(parse_date("01/15/2025"), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("27 Mar 2025"), Some(ymd(2025, 3, 27)));
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(StatementFormat::detect(Path::new("a/stmt.CSV")), Some(StatementFormat::Csv));
        assert_eq!(StatementFormat::detect(Path::new("stmt.pdf")), Some(StatementFormat::Pdf));
        assert_eq!(StatementFormat::detect(Path::new("stmt.xlsx")), None);
        assert_eq!(StatementFormat::detect(Path::new("stmt")), None);
    }

    #[test]
    fn test_parse_csv_normalizes_headers_and_ignores_extras() {
        let content = " Date ,DESCRIPTION,Balance, Amount\n\
                       2025-01-05,Uber ride,100.00,-20.00\n\
                       2025-01-06,Salary,120.00,\"1,500.00\"\n";
        let rows = parse_csv(content.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, ymd(2025, 1, 5));
        assert_eq!(rows[0].description, "Uber ride");
        assert_eq!(rows[0].amount, -20.0);
        assert_eq!(rows[1].amount, 1500.0);
    }

    #[test]
    fn test_parse_csv_missing_columns() {
        let content = "date,memo,amount\n2025-01-05,Uber,-20\n";
        match parse_csv(content.as_bytes()) {
            Err(BizError::MissingColumns(cols)) => assert_eq!(cols, vec!["description".to_string()]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_csv_bad_amount_is_error() {
        let content = "date,description,amount\n2025-01-05,Uber,lots\n";
        assert!(matches!(parse_csv(content.as_bytes()), Err(BizError::Parse(_))));
    }

    #[test]
    fn test_parse_csv_skips_blank_rows_and_keeps_order() {
        let content = "date,description,amount\n\
                       2025-01-07,Spotify,-10\n\
                       ,,\n\
                       2025-01-05,Uber ride,-20\n";
        let rows = parse_csv(content.as_bytes()).unwrap();
        let descs: Vec<&str> = rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descs, vec!["Spotify", "Uber ride"]);
    }

    #[test]
    fn test_statement_line_withdrawal() {
        let t = parse_statement_line("27 Mar THE WAREHOUSE 35.98 3,272.52", 2025).unwrap();
        assert_eq!(t.date, ymd(2025, 3, 27));
        assert_eq!(t.description, "THE WAREHOUSE");
        assert_eq!(t.amount, -35.98);
    }

    #[test]
    fn test_statement_line_deposit_only() {
        let t = parse_statement_line("28 Mar SALARY ACME LTD  1,500.00", 2025).unwrap();
        assert_eq!(t.description, "SALARY ACME LTD");
        assert_eq!(t.amount, 1500.0);
    }

    #[test]
    fn test_statement_line_single_amount() {
        let bare = parse_statement_line("05 Jan UBER TRIP 20.00", 2025).unwrap();
        assert_eq!(bare.description, "UBER TRIP");
        assert_eq!(bare.amount, -20.0);
        let padded = parse_statement_line("05 Jan UBER TRIP 20.00   \r", 2025).unwrap();
        assert_eq!(padded, bare);
        let deposit = parse_statement_line("07 Jan REFUND  15.00 ", 2025).unwrap();
        assert_eq!(deposit.amount, 15.0);
    }

    #[test]
    fn test_statement_line_without_amounts_is_skipped() {
        assert!(parse_statement_line("01 Apr OPENING BALANCE   ", 2025).is_none());
    }

    #[test]
    fn test_statement_line_rejects_headers() {
        assert!(parse_statement_line("Statement Period: Jan-Mar 2025", 2025).is_none());
        assert!(parse_statement_line("Date Transaction Withdrawals Deposits Balance", 2025).is_none());
        assert!(parse_statement_line("", 2025).is_none());
    }

    #[test]
    fn test_statement_line_invalid_day_is_skipped() {
        assert!(parse_statement_line("31 Feb ODD DAY 10.00 20.00", 2025).is_none());
        assert!(parse_statement_line("12 Xyz ODD MONTH 10.00 20.00", 2025).is_none());
    }

    #[test]
    fn test_pdf_pages_skip_noise_and_keep_page_order() {
        let pages = vec![
            "Statement Period: Jan-Mar 2025\n05 Jan UBER TRIP 20.00 980.00\nPage 1 of 2".to_string(),
            "Date Description Withdrawals Deposits\n06 Jan CAFE BRUNCH 15.00 965.00\r\n07 Jan REFUND  15.00".to_string(),
        ];
        let txns = parse_pdf_pages(&pages, 2025);
        let got: Vec<(&str, f64)> = txns.iter().map(|t| (t.description.as_str(), t.amount)).collect();
        assert_eq!(got, vec![("UBER TRIP", -20.0), ("CAFE BRUNCH", -15.0), ("REFUND", 15.0)]);
    }

    #[test]
    fn test_split_pages_on_form_feed() {
        assert_eq!(split_pages("a\u{000C}b\nc"), vec!["a", "b\nc"]);
    }

    #[test]
    fn test_write_transactions_csv() {
        let txns = vec![Transaction {
            date: ymd(2025, 3, 27),
            description: "THE WAREHOUSE".to_string(),
            amount: -35.98,
        }];
        let mut out = Vec::new();
        write_transactions_csv(&mut out, &txns).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "date,description,amount\n2025-03-27,THE WAREHOUSE,-35.98\n");
        let back = parse_csv(text.as_bytes()).unwrap();
        assert_eq!(back, txns);
    }
}
