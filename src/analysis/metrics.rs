//! Deterministic cash-flow analytics.
//!
//! Every number the agents and the dashboard consume is computed here, from
//! the ledger alone. The LLM pipeline narrates these figures; it never does
//! arithmetic.

use crate::models::{Ledger, PartyType, PaymentStatus, Priority, Transaction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many top customers/vendors to rank.
const TOP_PARTIES: usize = 10;

/// Amounts split by payment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSplit {
    pub paid: f64,
    pub pending: f64,
    pub overdue: f64,
}

impl StatusSplit {
    /// Add an amount under the given status.
    fn add(&mut self, status: PaymentStatus, amount: f64) {
        match status {
            PaymentStatus::Paid => self.paid += amount,
            PaymentStatus::Pending => self.pending += amount,
            PaymentStatus::Overdue => self.overdue += amount,
        }
    }
}

/// A counterparty and its total volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyTotal {
    pub name: String,
    pub total: f64,
}

/// Per-counterparty paid/pending/overdue amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyStatusBreakdown {
    pub name: String,
    pub paid: f64,
    pub pending: f64,
    pub overdue: f64,
}

/// One unsettled invoice or obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingItem {
    pub party_name: String,
    pub amount: f64,
    pub date: NaiveDate,
    /// Days since the transaction date, relative to the analysis date.
    pub days_outstanding: i64,
}

/// A labeled count, used for status/priority/category distributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// The full set of deterministic metrics for one ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowMetrics {
    /// Current cash balance (last running balance).
    pub current_balance: f64,
    /// Date of the most recent transaction.
    pub as_of: Option<NaiveDate>,
    /// Number of transactions analyzed.
    pub transaction_count: usize,
    /// Earliest transaction date.
    pub first_date: Option<NaiveDate>,
    /// Latest transaction date.
    pub last_date: Option<NaiveDate>,

    /// Total cash received.
    pub total_inflow: f64,
    /// Inflow amounts by payment status.
    pub inflow_by_status: StatusSplit,
    /// Top customers by revenue, descending.
    pub top_customers: Vec<PartyTotal>,
    /// Status breakdown for each top customer.
    pub top_customer_status: Vec<PartyStatusBreakdown>,

    /// Total cash spent.
    pub total_outflow: f64,
    /// Outflow amounts by payment status.
    pub outflow_by_status: StatusSplit,
    /// Top vendors by payables, descending.
    pub top_vendors: Vec<PartyTotal>,

    /// Overdue inflow rows (receivables), with day counts.
    pub overdue_receivables: Vec<OutstandingItem>,
    /// Pending outflow rows (payables), with day counts.
    pub pending_payables: Vec<OutstandingItem>,

    /// Total inflow minus total outflow.
    pub net_cash_flow: f64,
    /// Average daily cash loss over the ledger's date range. Zero or
    /// negative means the business generates cash.
    pub daily_burn_rate: f64,
    /// Days of cash left at the current burn rate. `None` means indefinite
    /// (the business is cash-positive or the ledger has a single row).
    pub cash_runway_days: Option<f64>,
    /// Inflow / outflow. `None` when there is no outflow.
    pub working_capital_ratio: Option<f64>,

    /// Transaction counts by payment status, descending.
    pub status_counts: Vec<LabelCount>,
    /// Transaction counts by priority, descending.
    pub priority_counts: Vec<LabelCount>,
    /// Transaction counts by category, descending.
    pub category_counts: Vec<LabelCount>,
    /// Rows whose counterparty is a client.
    pub client_transactions: usize,
    /// Rows whose counterparty is a supplier.
    pub supplier_transactions: usize,
    /// Pending rows flagged high priority.
    pub high_priority_pending: usize,
}

impl CashFlowMetrics {
    /// Total of all overdue receivables.
    pub fn overdue_total(&self) -> f64 {
        self.overdue_receivables.iter().map(|i| i.amount).sum()
    }

    /// Average overdue receivable, or zero when there are none.
    pub fn overdue_average(&self) -> f64 {
        if self.overdue_receivables.is_empty() {
            0.0
        } else {
            self.overdue_total() / self.overdue_receivables.len() as f64
        }
    }

    /// Total of all pending payables.
    pub fn pending_total(&self) -> f64 {
        self.pending_payables.iter().map(|i| i.amount).sum()
    }

    /// Average pending payable, or zero when there are none.
    pub fn pending_average(&self) -> f64 {
        if self.pending_payables.is_empty() {
            0.0
        } else {
            self.pending_total() / self.pending_payables.len() as f64
        }
    }
}

/// Percentage share of `part` in `total`, or `None` when `total` is not positive.
pub fn share(part: f64, total: f64) -> Option<f64> {
    if total > 0.0 {
        Some(part / total * 100.0)
    } else {
        None
    }
}

/// Compute all metrics for a ledger.
///
/// `today` anchors the days-outstanding arithmetic; callers pass the current
/// UTC date, tests pin a fixed one.
pub fn compute_metrics(ledger: &Ledger, today: NaiveDate) -> CashFlowMetrics {
    let txs = &ledger.transactions;

    let total_inflow = ledger.total_inflow();
    let total_outflow = ledger.total_outflow();

    let mut inflow_by_status = StatusSplit::default();
    let mut outflow_by_status = StatusSplit::default();
    for tx in txs {
        if tx.is_inflow() {
            inflow_by_status.add(tx.status, tx.inflow);
        }
        if tx.is_outflow() {
            outflow_by_status.add(tx.status, tx.outflow);
        }
    }

    let top_customers = top_parties(txs, |t| t.inflow, TOP_PARTIES);
    let top_vendors = top_parties(txs, |t| t.outflow, TOP_PARTIES);
    let top_customer_status = customer_status_breakdown(txs, &top_customers);

    let overdue_receivables = outstanding_items(
        txs,
        |t| t.is_inflow() && t.status == PaymentStatus::Overdue,
        |t| t.inflow,
        today,
    );
    let pending_payables = outstanding_items(
        txs,
        |t| t.is_outflow() && t.status == PaymentStatus::Pending,
        |t| t.outflow,
        today,
    );

    let first_date = txs.iter().map(|t| t.date).min();
    let last_date = txs.iter().map(|t| t.date).max();

    // Burn and runway need a date range; a single transaction has none.
    let (daily_burn_rate, cash_runway_days) = if txs.len() > 1 {
        let range_days = match (first_date, last_date) {
            (Some(first), Some(last)) => (last - first).num_days().max(1),
            _ => 1,
        };
        let burn = (total_outflow - total_inflow) / range_days as f64;
        let runway = if burn > 0.0 {
            Some(ledger.current_balance() / burn)
        } else {
            None
        };
        (burn, runway)
    } else {
        (0.0, None)
    };

    let working_capital_ratio = if total_outflow > 0.0 {
        Some(total_inflow / total_outflow)
    } else {
        None
    };

    let high_priority_pending = txs
        .iter()
        .filter(|t| t.status == PaymentStatus::Pending && t.priority == Priority::High)
        .count();

    CashFlowMetrics {
        current_balance: ledger.current_balance(),
        as_of: ledger.latest_date(),
        transaction_count: txs.len(),
        first_date,
        last_date,
        total_inflow,
        inflow_by_status,
        top_customers,
        top_customer_status,
        total_outflow,
        outflow_by_status,
        top_vendors,
        overdue_receivables,
        pending_payables,
        net_cash_flow: total_inflow - total_outflow,
        daily_burn_rate,
        cash_runway_days,
        working_capital_ratio,
        status_counts: distribution(txs, |t| t.status.to_string()),
        priority_counts: distribution(txs, |t| t.priority.to_string()),
        category_counts: distribution(txs, |t| t.category.clone()),
        client_transactions: txs
            .iter()
            .filter(|t| t.party_type == PartyType::Client)
            .count(),
        supplier_transactions: txs
            .iter()
            .filter(|t| t.party_type == PartyType::Supplier)
            .count(),
        high_priority_pending,
    }
}

/// Rank counterparties by the summed amount, descending, capped at `n`.
pub fn top_parties<F>(txs: &[Transaction], amount: F, n: usize) -> Vec<PartyTotal>
where
    F: Fn(&Transaction) -> f64,
{
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for tx in txs {
        let value = amount(tx);
        if value > 0.0 {
            *totals.entry(tx.party_name.as_str()).or_default() += value;
        }
    }

    let mut ranked: Vec<PartyTotal> = totals
        .into_iter()
        .map(|(name, total)| PartyTotal {
            name: name.to_string(),
            total,
        })
        .collect();

    // Name is the tiebreaker so equal totals rank deterministically.
    ranked.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(n);
    ranked
}

/// Paid/pending/overdue inflow breakdown for each ranked customer.
fn customer_status_breakdown(
    txs: &[Transaction],
    top_customers: &[PartyTotal],
) -> Vec<PartyStatusBreakdown> {
    top_customers
        .iter()
        .map(|customer| {
            let mut split = StatusSplit::default();
            for tx in txs.iter().filter(|t| t.is_inflow() && t.party_name == customer.name) {
                split.add(tx.status, tx.inflow);
            }
            PartyStatusBreakdown {
                name: customer.name.clone(),
                paid: split.paid,
                pending: split.pending,
                overdue: split.overdue,
            }
        })
        .collect()
}

/// Collect unsettled items matching a filter, newest debt first by amount.
fn outstanding_items<P, F>(
    txs: &[Transaction],
    filter: P,
    amount: F,
    today: NaiveDate,
) -> Vec<OutstandingItem>
where
    P: Fn(&Transaction) -> bool,
    F: Fn(&Transaction) -> f64,
{
    let mut items: Vec<OutstandingItem> = txs
        .iter()
        .filter(|t| filter(t))
        .map(|t| OutstandingItem {
            party_name: t.party_name.clone(),
            amount: amount(t),
            date: t.date,
            days_outstanding: (today - t.date).num_days(),
        })
        .collect();

    items.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.party_name.cmp(&b.party_name))
    });
    items
}

/// Count transactions by a label, descending by count then label.
pub fn distribution<F>(txs: &[Transaction], label: F) -> Vec<LabelCount>
where
    F: Fn(&Transaction) -> String,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for tx in txs {
        *counts.entry(label(tx)).or_default() += 1;
    }

    let mut entries: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries
}
