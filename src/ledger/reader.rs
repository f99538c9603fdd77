//! Spreadsheet readers for CSV and XLSX ledger files.
//!
//! Both readers normalize rows into [`Transaction`]s: dates are parsed from
//! the common spreadsheet formats, amounts are stripped of `$` and thousands
//! separators, and outflows recorded as negatives become magnitudes.

use crate::ledger::{assemble, LedgerError, ParsedRow, REQUIRED_COLUMNS};
use crate::models::{Ledger, PartyType, PaymentStatus, Priority, Transaction};
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::{debug, info, warn};

/// Read a ledger file, dispatching on the file extension.
pub fn read_ledger(path: &Path) -> Result<Ledger> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    info!("Reading ledger file: {}", path.display());

    match extension.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xls" => read_xlsx(path),
        other => Err(LedgerError::UnsupportedFormat(other.to_string()).into()),
    }
}

/// Resolved column indices for one spreadsheet.
#[derive(Debug, Clone)]
struct ColumnMap {
    date: usize,
    party_name: usize,
    inflow: usize,
    outflow: usize,
    status: usize,
    party_type: Option<usize>,
    priority: Option<usize>,
    category: Option<usize>,
    notes: Option<usize>,
    balance: Option<usize>,
}

impl ColumnMap {
    /// Resolve header names to indices (case-insensitive, trimmed).
    ///
    /// The error lists every missing required column, not just the first.
    fn resolve(headers: &[String]) -> Result<Self, LedgerError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(LedgerError::MissingColumns(missing));
        }

        Ok(Self {
            date: find("Date").unwrap(),
            party_name: find("Party Name").unwrap(),
            inflow: find("Cash Inflow").unwrap(),
            outflow: find("Cash Outflow").unwrap(),
            status: find("Payment Status").unwrap(),
            party_type: find("Party Type"),
            priority: find("Priority"),
            category: find("Category"),
            notes: find("Notes"),
            balance: find("Running Balance"),
        })
    }
}

/// Read a CSV ledger.
fn read_csv(path: &Path) -> Result<Ledger> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(String::from)
        .collect();

    if headers.is_empty() {
        return Err(LedgerError::EmptyFile(path.display().to_string()).into());
    }

    let map = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    let mut rows_read = 0;
    let mut rows_skipped = 0;

    for (idx, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read CSV record {} in {}", idx + 2, path.display()))?;
        rows_read += 1;

        let cells: Vec<String> = record.iter().map(String::from).collect();
        match parse_row(&cells, &map, idx + 2) {
            Some(row) => rows.push(row),
            None => rows_skipped += 1,
        }
    }

    if rows_read == 0 {
        return Err(LedgerError::EmptyFile(path.display().to_string()).into());
    }

    let ledger = assemble(&path.display().to_string(), rows, rows_read, rows_skipped)?;
    info!(
        "Ingested {} transactions ({} skipped) from {}",
        ledger.transactions.len(),
        rows_skipped,
        path.display()
    );
    Ok(ledger)
}

/// Read the first worksheet of an Excel workbook.
fn read_xlsx(path: &Path) -> Result<Ledger> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LedgerError::EmptyFile(path.display().to_string()))?
        .with_context(|| format!("Failed to read worksheet in {}", path.display()))?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = match row_iter.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => return Err(LedgerError::EmptyFile(path.display().to_string()).into()),
    };

    let map = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    let mut rows_read = 0;
    let mut rows_skipped = 0;

    for (idx, sheet_row) in row_iter.enumerate() {
        // Fully empty rows at the bottom of a sheet are not data.
        if sheet_row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        rows_read += 1;

        let cells: Vec<String> = sheet_row.iter().map(cell_to_string).collect();
        match parse_row(&cells, &map, idx + 2) {
            Some(row) => rows.push(row),
            None => rows_skipped += 1,
        }
    }

    if rows_read == 0 {
        return Err(LedgerError::EmptyFile(path.display().to_string()).into());
    }

    let ledger = assemble(&path.display().to_string(), rows, rows_read, rows_skipped)?;
    info!(
        "Ingested {} transactions ({} skipped) from {}",
        ledger.transactions.len(),
        rows_skipped,
        path.display()
    );
    Ok(ledger)
}

/// Render an Excel cell to text so both readers share one row parser.
///
/// Date cells come through in ISO form; numbers keep their full precision.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            warn!("Error cell in ledger: {:?}", e);
            String::new()
        }
    }
}

/// Parse one data row. Returns `None` when the row is unusable.
fn parse_row(cells: &[String], map: &ColumnMap, line: usize) -> Option<ParsedRow> {
    let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or("");

    let date = match parse_date(cell(map.date)) {
        Some(d) => d,
        None => {
            warn!("Row {}: unparsable date '{}', skipping", line, cell(map.date));
            return None;
        }
    };

    let inflow = parse_amount(cell(map.inflow));
    let outflow = parse_amount(cell(map.outflow));
    if inflow.is_none() && outflow.is_none() {
        warn!("Row {}: no parsable amount, skipping", line);
        return None;
    }

    let status_raw = cell(map.status);
    let status = PaymentStatus::parse(status_raw).unwrap_or_else(|| {
        if !status_raw.is_empty() {
            warn!(
                "Row {}: unknown payment status '{}', defaulting to Pending",
                line, status_raw
            );
        }
        PaymentStatus::Pending
    });

    let party_name = {
        let name = cell(map.party_name).trim();
        if name.is_empty() { "Unknown" } else { name }.to_string()
    };

    let party_type = map
        .party_type
        .map(|i| PartyType::from(cell(i)))
        .unwrap_or(PartyType::Other("unspecified".to_string()));

    let priority = map
        .priority
        .map(|i| Priority::from(cell(i)))
        .unwrap_or(Priority::Medium);

    let category = map
        .category
        .map(|i| cell(i).trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "Uncategorized".to_string());

    let notes = map
        .notes
        .map(|i| cell(i).trim().to_string())
        .filter(|n| !n.is_empty());

    // A blank balance cell is absent, not zero, so the whole ledger falls
    // back to deriving balances.
    let carried_balance = map.balance.and_then(|i| {
        let raw = cell(i);
        if raw.trim().is_empty() {
            None
        } else {
            parse_amount(raw)
        }
    });

    if inflow.is_none() || outflow.is_none() {
        debug!("Row {}: one amount cell unparsable, treated as zero", line);
    }

    Some(ParsedRow {
        tx: Transaction {
            date,
            party_name,
            party_type,
            // Some exports record outflows as negative numbers.
            inflow: inflow.unwrap_or(0.0).abs(),
            outflow: outflow.unwrap_or(0.0).abs(),
            status,
            priority,
            category,
            notes,
            running_balance: 0.0,
        },
        carried_balance,
    })
}

/// Parse a date cell, accepting the common spreadsheet formats.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Parse an amount cell.
///
/// Empty cells are zero (absent amounts, not errors). `$`, thousands
/// separators and surrounding whitespace are stripped; accountant-style
/// parentheses mean negative.
fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    let (s, negative) = if s.starts_with('(') && s.ends_with(')') {
        (&s[1..s.len() - 1], true)
    } else {
        (s, false)
    };

    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();

    cleaned.parse::<f64>().ok().map(|v| if negative { -v } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(expected));
        assert_eq!(parse_date("03/15/2024"), Some(expected));
        assert_eq!(parse_date("15-03-2024"), Some(expected));
        assert_eq!(parse_date("2024-03-15 10:30:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1234.56"), Some(1234.56));
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("-500"), Some(-500.0));
        assert_eq!(parse_amount("(250.00)"), Some(-250.0));
        assert_eq!(parse_amount(""), Some(0.0));
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_column_map_reports_all_missing() {
        let headers = vec!["Date".to_string(), "Notes".to_string()];
        let err = ColumnMap::resolve(&headers).unwrap_err();

        match err {
            LedgerError::MissingColumns(cols) => {
                assert_eq!(
                    cols,
                    vec!["Party Name", "Cash Inflow", "Cash Outflow", "Payment Status"]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_column_map_case_insensitive() {
        let headers: Vec<String> = [
            "date",
            "PARTY NAME",
            "Cash Inflow",
            "cash outflow",
            "Payment Status",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert!(ColumnMap::resolve(&headers).is_ok());
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_csv_ledger() {
        let file = write_csv(
            "Date,Party Name,Party Type,Cash Inflow,Cash Outflow,Payment Status,Priority,Category\n\
             2024-01-05,Acme Corp,Client,1000,0,Paid,High,Sales\n\
             2024-01-10,Office Depot,Supplier,0,$250.00,Pending,Low,Supplies\n\
             2024-01-20,Beta LLC,Client,500,0,Overdue,Medium,Sales\n",
        );

        let ledger = read_ledger(file.path()).unwrap();

        assert_eq!(ledger.transactions.len(), 3);
        assert_eq!(ledger.stats.rows_read, 3);
        assert_eq!(ledger.stats.rows_skipped, 0);
        assert!(!ledger.stats.balance_carried);
        assert_eq!(ledger.current_balance(), 1250.0);
        assert_eq!(ledger.transactions[1].outflow, 250.0);
        assert_eq!(ledger.transactions[1].status, PaymentStatus::Pending);
    }

    #[test]
    fn test_read_csv_skips_bad_rows() {
        let file = write_csv(
            "Date,Party Name,Cash Inflow,Cash Outflow,Payment Status\n\
             2024-01-05,Acme Corp,1000,0,Paid\n\
             not-a-date,Beta LLC,500,0,Paid\n",
        );

        let ledger = read_ledger(file.path()).unwrap();

        assert_eq!(ledger.transactions.len(), 1);
        assert_eq!(ledger.stats.rows_skipped, 1);
    }

    #[test]
    fn test_read_csv_missing_columns() {
        let file = write_csv("Date,Party Name\n2024-01-05,Acme Corp\n");

        let err = read_ledger(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Cash Inflow"));
        assert!(msg.contains("Payment Status"));
    }

    #[test]
    fn test_read_unsupported_extension() {
        let err = read_ledger(Path::new("ledger.pdf")).unwrap_err();
        assert!(err.to_string().contains("unsupported file format"));
    }

    #[test]
    fn test_read_fixture_ledger() {
        let path = Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/fixtures/sample_ledger.csv"
        ));

        let ledger = read_ledger(path).unwrap();

        assert_eq!(ledger.transactions.len(), 12);
        assert_eq!(ledger.stats.rows_skipped, 0);
        // 54,900 in, 14,950 out.
        assert_eq!(ledger.total_inflow(), 54900.0);
        assert_eq!(ledger.total_outflow(), 14950.0);
        assert_eq!(ledger.current_balance(), 39950.0);
    }

    #[test]
    fn test_negative_outflow_normalized() {
        let file = write_csv(
            "Date,Party Name,Cash Inflow,Cash Outflow,Payment Status\n\
             2024-01-05,Vendor,0,-300,Paid\n",
        );

        let ledger = read_ledger(file.path()).unwrap();
        assert_eq!(ledger.transactions[0].outflow, 300.0);
        assert_eq!(ledger.current_balance(), -300.0);
    }
}
