//! Transaction ledger ingestion.
//!
//! This module reads a ledger spreadsheet (CSV or XLSX), validates the
//! required columns, and produces a [`Ledger`] with a running balance.

pub mod reader;

pub use reader::read_ledger;

use crate::models::{IngestStats, Ledger, Transaction};
use thiserror::Error;

/// Column headers that must be present in every ledger file.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Date",
    "Party Name",
    "Cash Inflow",
    "Cash Outflow",
    "Payment Status",
];

/// Errors produced while ingesting a ledger file.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The file extension is not one of the supported spreadsheet formats.
    #[error("unsupported file format '{0}': expected .csv or .xlsx")]
    UnsupportedFormat(String),

    /// One or more required columns are missing from the header row.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The file contained a header but no usable transaction rows.
    #[error("no usable transactions found in {0}")]
    NoTransactions(String),

    /// The spreadsheet has no rows at all.
    #[error("file is empty: {0}")]
    EmptyFile(String),
}

/// A parsed row before the ledger-level balance pass.
#[derive(Debug, Clone)]
pub(crate) struct ParsedRow {
    pub tx: Transaction,
    /// Running balance carried in the file, if the column was present.
    pub carried_balance: Option<f64>,
}

/// Assemble parsed rows into a [`Ledger`].
///
/// When every row carries a balance from the file, the file's row order and
/// balances are preserved. Otherwise rows are sorted by date and the balance
/// is the cumulative sum of (inflow - outflow).
pub(crate) fn assemble(
    source: &str,
    mut rows: Vec<ParsedRow>,
    rows_read: usize,
    rows_skipped: usize,
) -> Result<Ledger, LedgerError> {
    if rows.is_empty() {
        return Err(LedgerError::NoTransactions(source.to_string()));
    }

    let balance_carried = rows.iter().all(|r| r.carried_balance.is_some());

    let transactions: Vec<Transaction> = if balance_carried {
        rows.into_iter()
            .map(|mut r| {
                r.tx.running_balance = r.carried_balance.unwrap_or(0.0);
                r.tx
            })
            .collect()
    } else {
        rows.sort_by_key(|r| r.tx.date);
        let mut balance = 0.0;
        rows.into_iter()
            .map(|mut r| {
                balance += r.tx.net();
                r.tx.running_balance = balance;
                r.tx
            })
            .collect()
    };

    Ok(Ledger {
        source: source.to_string(),
        transactions,
        stats: IngestStats {
            rows_read,
            rows_skipped,
            balance_carried,
        },
    })
}
