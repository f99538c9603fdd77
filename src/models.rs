//! Data models for the financial health analyzer.
//!
//! This module contains the core data structures used throughout
//! the application for representing ledger transactions and reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment status of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Settled - cash has actually moved
    Paid,
    /// Invoiced or scheduled but not yet settled
    Pending,
    /// Past its due date and still unsettled
    Overdue,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Overdue => write!(f, "Overdue"),
        }
    }
}

impl PaymentStatus {
    /// Parse a spreadsheet cell value, returning `None` for unknown strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "paid" | "settled" | "complete" | "completed" => Some(PaymentStatus::Paid),
            "pending" | "open" | "unpaid" => Some(PaymentStatus::Pending),
            "overdue" | "late" | "past due" => Some(PaymentStatus::Overdue),
            _ => None,
        }
    }

    /// Returns an emoji representation of the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "✅",
            PaymentStatus::Pending => "⏳",
            PaymentStatus::Overdue => "⚠️",
        }
    }
}

/// Priority assigned to a transaction by the bookkeeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl From<&str> for Priority {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" | "urgent" | "critical" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

/// Counterparty classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyType {
    /// A customer paying the business
    Client,
    /// A vendor the business pays
    Supplier,
    Other(String),
}

impl fmt::Display for PartyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyType::Client => write!(f, "Client"),
            PartyType::Supplier => write!(f, "Supplier"),
            PartyType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for PartyType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "client" | "customer" => PartyType::Client,
            "supplier" | "vendor" => PartyType::Supplier,
            other => PartyType::Other(other.to_string()),
        }
    }
}

/// A single row of the transaction ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction date.
    pub date: NaiveDate,
    /// Counterparty name (customer or vendor).
    pub party_name: String,
    /// Counterparty classification.
    pub party_type: PartyType,
    /// Cash received, as a non-negative magnitude.
    pub inflow: f64,
    /// Cash spent, as a non-negative magnitude.
    pub outflow: f64,
    /// Settlement status of the transaction.
    pub status: PaymentStatus,
    /// Bookkeeper-assigned priority.
    pub priority: Priority,
    /// Expense or revenue category.
    pub category: String,
    /// Free-form notes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Cash balance after this transaction.
    pub running_balance: f64,
}

impl Transaction {
    /// Net cash movement of this transaction (inflow minus outflow).
    pub fn net(&self) -> f64 {
        self.inflow - self.outflow
    }

    /// True when the row represents money coming in.
    pub fn is_inflow(&self) -> bool {
        self.inflow > 0.0
    }

    /// True when the row represents money going out.
    pub fn is_outflow(&self) -> bool {
        self.outflow > 0.0
    }
}

/// Statistics gathered while ingesting a ledger file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Data rows read from the file (excluding the header).
    pub rows_read: usize,
    /// Rows dropped because the date or both amounts failed to parse.
    pub rows_skipped: usize,
    /// Whether the file carried its own Running Balance column.
    pub balance_carried: bool,
}

/// A validated, date-ordered transaction ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    /// Path of the source spreadsheet.
    pub source: String,
    /// Transactions, date-ordered when the balance was derived; a carried
    /// balance column keeps the file's own order.
    pub transactions: Vec<Transaction>,
    /// Ingestion statistics.
    pub stats: IngestStats,
}

impl Ledger {
    /// Current cash balance (running balance of the last transaction).
    pub fn current_balance(&self) -> f64 {
        self.transactions
            .last()
            .map(|t| t.running_balance)
            .unwrap_or(0.0)
    }

    /// Date of the most recent transaction.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.transactions.last().map(|t| t.date)
    }

    /// Total cash received across the ledger.
    pub fn total_inflow(&self) -> f64 {
        self.transactions.iter().map(|t| t.inflow).sum()
    }

    /// Total cash spent across the ledger.
    pub fn total_outflow(&self) -> f64 {
        self.transactions.iter().map(|t| t.outflow).sum()
    }
}

/// One agent's generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    /// Agent name (e.g. "Cash Flow Analyst").
    pub agent: String,
    /// Section title used in the combined report.
    pub title: String,
    /// Filename the report was written to.
    pub file_name: String,
    /// The generated Markdown content.
    pub content: String,
    /// Seconds spent waiting on the model for this task.
    pub duration_seconds: f64,
}

/// Metadata about the analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the analyzed ledger file.
    pub source_file: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used (empty for dry runs).
    pub model_used: String,
    /// Number of transactions analyzed.
    pub transaction_count: usize,
    /// Rows skipped during ingestion.
    pub rows_skipped: usize,
    /// Duration of the full run in seconds.
    pub duration_seconds: f64,
}

/// The complete financial health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the run.
    pub metadata: ReportMetadata,
    /// Deterministic cash-flow metrics.
    pub metrics: crate::analysis::CashFlowMetrics,
    /// The plain-text digest the agents analyzed.
    pub digest: String,
    /// One section per pipeline agent, in execution order.
    pub agent_reports: Vec<AgentReport>,
}

/// Format an amount as dollars with thousands separators, e.g. `$12,345.67`.
///
/// Negative amounts render as `$-12,345.67`, matching the digest layout.
pub fn format_money(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("$-{}.{:02}", grouped, frac)
    } else {
        format!("${}.{:02}", grouped, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(PaymentStatus::parse("Paid"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::parse("PENDING"), Some(PaymentStatus::Pending));
        assert_eq!(PaymentStatus::parse(" overdue "), Some(PaymentStatus::Overdue));
        assert_eq!(PaymentStatus::parse("unknown"), None);
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!(Priority::from("High"), Priority::High);
        assert_eq!(Priority::from("URGENT"), Priority::High);
        assert_eq!(Priority::from("low"), Priority::Low);
        assert_eq!(Priority::from(""), Priority::Medium);
    }

    #[test]
    fn test_party_type_from_str() {
        assert_eq!(PartyType::from("Client"), PartyType::Client);
        assert_eq!(PartyType::from("vendor"), PartyType::Supplier);
        assert_eq!(
            PartyType::from("bank"),
            PartyType::Other("bank".to_string())
        );
    }

    #[test]
    fn test_transaction_net() {
        let tx = Transaction {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            party_name: "Acme".to_string(),
            party_type: PartyType::Client,
            inflow: 1500.0,
            outflow: 0.0,
            status: PaymentStatus::Paid,
            priority: Priority::Medium,
            category: "Sales".to_string(),
            notes: None,
            running_balance: 1500.0,
        };
        assert_eq!(tx.net(), 1500.0);
        assert!(tx.is_inflow());
        assert!(!tx.is_outflow());
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(1234567.891), "$1,234,567.89");
        assert_eq!(format_money(-9876.54), "$-9,876.54");
        assert_eq!(format_money(999.999), "$1,000.00");
    }
}
