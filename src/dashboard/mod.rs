//! Dashboard chart datasets.
//!
//! Produces the data behind the interactive dashboard's four charts:
//! running-balance trend, monthly inflow vs outflow, payment-status
//! distribution, and top customers. Rendering is left to whatever front
//! end consumes the exported JSON.

use crate::analysis::metrics::{CashFlowMetrics, LabelCount, PartyTotal};
use crate::models::Ledger;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// How many customers the revenue chart shows.
const TOP_CUSTOMER_CHART_LIMIT: usize = 5;

/// One point of the running-balance series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: f64,
}

/// Inflow and outflow totals for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyFlow {
    /// Month label in `YYYY-MM` form.
    pub month: String,
    pub inflow: f64,
    pub outflow: f64,
}

/// All chart datasets for one analyzed ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    /// Running balance over time.
    pub balance_trend: Vec<BalancePoint>,
    /// Monthly inflow vs outflow, in month order.
    pub monthly_flows: Vec<MonthlyFlow>,
    /// Transaction counts by payment status.
    pub status_distribution: Vec<LabelCount>,
    /// Top customers by revenue, descending.
    pub top_customers: Vec<PartyTotal>,
}

/// Build the dashboard datasets from the ledger and its metrics.
pub fn build_dashboard(ledger: &Ledger, metrics: &CashFlowMetrics) -> Dashboard {
    let balance_trend = ledger
        .transactions
        .iter()
        .map(|t| BalancePoint {
            date: t.date,
            balance: t.running_balance,
        })
        .collect();

    // BTreeMap keys sort lexicographically, which for YYYY-MM is date order.
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for tx in &ledger.transactions {
        let entry = months
            .entry(tx.date.format("%Y-%m").to_string())
            .or_insert((0.0, 0.0));
        entry.0 += tx.inflow;
        entry.1 += tx.outflow;
    }
    let monthly_flows = months
        .into_iter()
        .map(|(month, (inflow, outflow))| MonthlyFlow {
            month,
            inflow,
            outflow,
        })
        .collect();

    Dashboard {
        balance_trend,
        monthly_flows,
        status_distribution: metrics.status_counts.clone(),
        top_customers: metrics
            .top_customers
            .iter()
            .take(TOP_CUSTOMER_CHART_LIMIT)
            .cloned()
            .collect(),
    }
}

/// Serialize the dashboard to pretty JSON.
pub fn generate_dashboard_json(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Write the dashboard JSON to a file.
pub fn write_dashboard(dashboard: &Dashboard, path: &Path) -> Result<()> {
    let content = generate_dashboard_json(dashboard)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write dashboard to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_metrics;
    use crate::models::{
        IngestStats, PartyType, PaymentStatus, Priority, Transaction,
    };

    fn sample_ledger() -> Ledger {
        let mut txs = vec![
            tx(2024, 1, 5, "Acme", 1000.0, 0.0, PaymentStatus::Paid),
            tx(2024, 1, 20, "Vendor", 0.0, 400.0, PaymentStatus::Paid),
            tx(2024, 2, 3, "Beta", 600.0, 0.0, PaymentStatus::Pending),
        ];
        let mut balance = 0.0;
        for t in txs.iter_mut() {
            balance += t.inflow - t.outflow;
            t.running_balance = balance;
        }
        Ledger {
            source: "test.csv".to_string(),
            transactions: txs,
            stats: IngestStats::default(),
        }
    }

    fn tx(
        year: i32,
        month: u32,
        day: u32,
        party: &str,
        inflow: f64,
        outflow: f64,
        status: PaymentStatus,
    ) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            party_name: party.to_string(),
            party_type: PartyType::Client,
            inflow,
            outflow,
            status,
            priority: Priority::Medium,
            category: "General".to_string(),
            notes: None,
            running_balance: 0.0,
        }
    }

    #[test]
    fn test_balance_trend_follows_ledger() {
        let ledger = sample_ledger();
        let metrics = compute_metrics(&ledger, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let dashboard = build_dashboard(&ledger, &metrics);

        assert_eq!(dashboard.balance_trend.len(), 3);
        assert_eq!(dashboard.balance_trend[0].balance, 1000.0);
        assert_eq!(dashboard.balance_trend[2].balance, 1200.0);
    }

    #[test]
    fn test_monthly_flows_grouped_and_ordered() {
        let ledger = sample_ledger();
        let metrics = compute_metrics(&ledger, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let dashboard = build_dashboard(&ledger, &metrics);

        assert_eq!(dashboard.monthly_flows.len(), 2);
        assert_eq!(dashboard.monthly_flows[0].month, "2024-01");
        assert_eq!(dashboard.monthly_flows[0].inflow, 1000.0);
        assert_eq!(dashboard.monthly_flows[0].outflow, 400.0);
        assert_eq!(dashboard.monthly_flows[1].month, "2024-02");
        assert_eq!(dashboard.monthly_flows[1].inflow, 600.0);
    }

    #[test]
    fn test_dashboard_json_round_trip() {
        let ledger = sample_ledger();
        let metrics = compute_metrics(&ledger, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let dashboard = build_dashboard(&ledger, &metrics);

        let json = generate_dashboard_json(&dashboard).unwrap();
        assert!(json.contains("\"balance_trend\""));
        assert!(json.contains("\"monthly_flows\""));

        let parsed: Dashboard = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.top_customers.len(), dashboard.top_customers.len());
    }
}
