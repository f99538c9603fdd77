//! Plain-text digest of the computed metrics.
//!
//! The digest is the exact text every agent prompt embeds, so the model
//! narrates real customer names and amounts instead of inventing them.
//! Fixed-width columns keep the tables readable inside a prompt.

use crate::analysis::metrics::{share, CashFlowMetrics};
use crate::models::format_money;

const BANNER_WIDTH: usize = 80;

/// Render the full digest.
pub fn render_digest(metrics: &CashFlowMetrics) -> String {
    let mut out = String::new();

    section(&mut out, "CASH POSITION SNAPSHOT");
    out.push_str(&format!(
        "Current Cash Balance: {}\n",
        format_money(metrics.current_balance)
    ));
    if let Some(as_of) = metrics.as_of {
        out.push_str(&format!("As of Date: {}\n", as_of.format("%Y-%m-%d")));
    }
    out.push_str(&format!(
        "Total Transactions Processed: {}\n",
        metrics.transaction_count
    ));

    section(&mut out, "INFLOW ANALYSIS (Revenue)");
    out.push_str(&format!(
        "Total Inflows: {}\n",
        format_money(metrics.total_inflow)
    ));
    status_lines(
        &mut out,
        metrics.total_inflow,
        metrics.inflow_by_status.paid,
        metrics.inflow_by_status.pending,
        metrics.inflow_by_status.overdue,
    );

    if !metrics.top_customers.is_empty() {
        out.push_str("\nTop Customers by Revenue:\n");
        out.push_str(&format!(
            "{:<6} {:<40} {:<15} {:<10}\n",
            "Rank", "Customer Name", "Amount", "% of Total"
        ));
        out.push_str(&format!("{}\n", "-".repeat(71)));
        for (rank, customer) in metrics.top_customers.iter().enumerate() {
            let pct = share(customer.total, metrics.total_inflow).unwrap_or(0.0);
            out.push_str(&format!(
                "{:<6} {:<40} ${:>12}  {:>7.1}%\n",
                rank + 1,
                customer.name,
                plain(customer.total),
                pct
            ));
        }

        out.push_str("\nTop Customers - Payment Status Breakdown:\n");
        out.push_str(&format!(
            "{:<40} {:<15} {:<15} {:<15}\n",
            "Customer Name", "Paid", "Pending", "Overdue"
        ));
        out.push_str(&format!("{}\n", "-".repeat(85)));
        for entry in &metrics.top_customer_status {
            out.push_str(&format!(
                "{:<40} ${:>12}  ${:>12}  ${:>12}\n",
                entry.name,
                plain(entry.paid),
                plain(entry.pending),
                plain(entry.overdue)
            ));
        }
    }

    section(&mut out, "OUTFLOW ANALYSIS (Expenses)");
    out.push_str(&format!(
        "Total Outflows: {}\n",
        format_money(metrics.total_outflow)
    ));
    status_lines(
        &mut out,
        metrics.total_outflow,
        metrics.outflow_by_status.paid,
        metrics.outflow_by_status.pending,
        metrics.outflow_by_status.overdue,
    );

    if !metrics.top_vendors.is_empty() {
        out.push_str("\nTop Vendors by Payables:\n");
        out.push_str(&format!(
            "{:<6} {:<40} {:<15} {:<10}\n",
            "Rank", "Vendor Name", "Amount", "% of Total"
        ));
        out.push_str(&format!("{}\n", "-".repeat(71)));
        for (rank, vendor) in metrics.top_vendors.iter().enumerate() {
            let pct = share(vendor.total, metrics.total_outflow).unwrap_or(0.0);
            out.push_str(&format!(
                "{:<6} {:<40} ${:>12}  {:>7.1}%\n",
                rank + 1,
                vendor.name,
                plain(vendor.total),
                pct
            ));
        }
    }

    section(&mut out, "OVERDUE RECEIVABLES ANALYSIS");
    out.push_str(&format!(
        "Total Overdue Amount: {}\n",
        format_money(metrics.overdue_total())
    ));
    out.push_str(&format!(
        "Number of Overdue Invoices: {}\n",
        metrics.overdue_receivables.len()
    ));
    if !metrics.overdue_receivables.is_empty() {
        out.push_str(&format!(
            "Average Overdue Amount: {}\n",
            format_money(metrics.overdue_average())
        ));
        out.push_str("\nOverdue Invoices Detail:\n");
        out.push_str(&format!(
            "{:<40} {:<15} {:<15} {:<12}\n",
            "Customer Name", "Amount", "Date", "Days Overdue"
        ));
        out.push_str(&format!("{}\n", "-".repeat(82)));
        for item in &metrics.overdue_receivables {
            out.push_str(&format!(
                "{:<40} ${:>12}  {:<15} {:>10} days\n",
                item.party_name,
                plain(item.amount),
                item.date.format("%Y-%m-%d"),
                item.days_outstanding
            ));
        }
    }

    section(&mut out, "PENDING PAYABLES ANALYSIS");
    out.push_str(&format!(
        "Total Pending Payables: {}\n",
        format_money(metrics.pending_total())
    ));
    out.push_str(&format!(
        "Number of Pending Obligations: {}\n",
        metrics.pending_payables.len()
    ));
    if !metrics.pending_payables.is_empty() {
        out.push_str(&format!(
            "Average Pending Amount: {}\n",
            format_money(metrics.pending_average())
        ));
        out.push_str("\nPending Payables Detail:\n");
        out.push_str(&format!(
            "{:<40} {:<15} {:<15} {:<15}\n",
            "Vendor Name", "Amount", "Date", "Days Outstanding"
        ));
        out.push_str(&format!("{}\n", "-".repeat(85)));
        for item in &metrics.pending_payables {
            out.push_str(&format!(
                "{:<40} ${:>12}  {:<15} {:>13} days\n",
                item.party_name,
                plain(item.amount),
                item.date.format("%Y-%m-%d"),
                item.days_outstanding
            ));
        }
    }

    section(&mut out, "TRANSACTION PROFILE");
    out.push_str(&format!(
        "Client Transactions (Sales): {}\n",
        metrics.client_transactions
    ));
    out.push_str(&format!(
        "Supplier Transactions (Purchases): {}\n",
        metrics.supplier_transactions
    ));
    out.push_str(&format!(
        "High Priority Pending: {}\n",
        metrics.high_priority_pending
    ));
    count_table(&mut out, "Payment Status Distribution:", &metrics.status_counts);
    count_table(&mut out, "Priority Distribution:", &metrics.priority_counts);
    count_table(&mut out, "Transaction Categories:", &metrics.category_counts);

    section(&mut out, "KEY FINANCIAL METRICS");
    out.push_str(&format!(
        "Total Cash Inflows: {}\n",
        format_money(metrics.total_inflow)
    ));
    out.push_str(&format!(
        "Total Cash Outflows: {}\n",
        format_money(metrics.total_outflow)
    ));
    out.push_str(&format!(
        "Net Cash Flow: {}\n",
        format_money(metrics.net_cash_flow)
    ));
    out.push_str(&format!(
        "Current Cash Balance: {}\n",
        format_money(metrics.current_balance)
    ));
    out.push_str(&format!(
        "Daily Burn Rate: {}\n",
        format_money(metrics.daily_burn_rate)
    ));
    match metrics.cash_runway_days {
        Some(days) => out.push_str(&format!("Cash Runway: {:.1} days\n", days)),
        None => out.push_str("Cash Runway: Positive cash generation (indefinite)\n"),
    }
    match metrics.working_capital_ratio {
        Some(ratio) => out.push_str(&format!("Working Capital Ratio: {:.2}x\n", ratio)),
        None => out.push_str("Working Capital Ratio: N/A\n"),
    }

    out
}

/// Push a banner-delimited section header.
fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&"=".repeat(BANNER_WIDTH));
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(BANNER_WIDTH));
    out.push('\n');
}

/// Push the paid/pending/overdue breakdown lines when the total is positive.
fn status_lines(out: &mut String, total: f64, paid: f64, pending: f64, overdue: f64) {
    if total <= 0.0 {
        return;
    }
    for (label, amount) in [("Paid", paid), ("Pending", pending), ("Overdue", overdue)] {
        let pct = share(amount, total).unwrap_or(0.0);
        out.push_str(&format!(
            "  - {}: {} ({:.1}%)\n",
            label,
            format_money(amount),
            pct
        ));
    }
}

/// Push a small label/count table.
fn count_table(out: &mut String, title: &str, entries: &[crate::analysis::metrics::LabelCount]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}\n", title));
    for entry in entries {
        out.push_str(&format!("  {:<20} {}\n", entry.label, entry.count));
    }
}

/// Money without the `$` prefix, for right-aligned table cells.
fn plain(amount: f64) -> String {
    let formatted = format_money(amount);
    formatted.trim_start_matches('$').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::compute_metrics;
    use crate::models::{
        IngestStats, Ledger, PartyType, PaymentStatus, Priority, Transaction,
    };
    use chrono::NaiveDate;

    fn sample_ledger() -> Ledger {
        let mut txs = vec![
            Transaction {
                date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                party_name: "Acme Corp".to_string(),
                party_type: PartyType::Client,
                inflow: 12000.0,
                outflow: 0.0,
                status: PaymentStatus::Paid,
                priority: Priority::Medium,
                category: "Sales".to_string(),
                notes: None,
                running_balance: 0.0,
            },
            Transaction {
                date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
                party_name: "Beta LLC".to_string(),
                party_type: PartyType::Client,
                inflow: 4500.0,
                outflow: 0.0,
                status: PaymentStatus::Overdue,
                priority: Priority::High,
                category: "Sales".to_string(),
                notes: None,
                running_balance: 0.0,
            },
            Transaction {
                date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
                party_name: "Office Depot".to_string(),
                party_type: PartyType::Supplier,
                inflow: 0.0,
                outflow: 2500.0,
                status: PaymentStatus::Pending,
                priority: Priority::High,
                category: "Supplies".to_string(),
                notes: None,
                running_balance: 0.0,
            },
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

    #[test]
    fn test_digest_contains_all_sections() {
        let metrics = compute_metrics(
            &sample_ledger(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );
        let digest = render_digest(&metrics);

        for heading in [
            "CASH POSITION SNAPSHOT",
            "INFLOW ANALYSIS (Revenue)",
            "OUTFLOW ANALYSIS (Expenses)",
            "OVERDUE RECEIVABLES ANALYSIS",
            "PENDING PAYABLES ANALYSIS",
            "TRANSACTION PROFILE",
            "KEY FINANCIAL METRICS",
        ] {
            assert!(digest.contains(heading), "missing section: {}", heading);
        }
    }

    #[test]
    fn test_digest_uses_real_names_and_amounts() {
        let metrics = compute_metrics(
            &sample_ledger(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );
        let digest = render_digest(&metrics);

        assert!(digest.contains("Acme Corp"));
        assert!(digest.contains("Beta LLC"));
        assert!(digest.contains("$16,500.00")); // total inflows
        assert!(digest.contains("$4,500.00")); // overdue total
        assert!(digest.contains("Current Cash Balance: $14,000.00"));
    }

    #[test]
    fn test_digest_days_overdue() {
        let metrics = compute_metrics(
            &sample_ledger(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );
        let digest = render_digest(&metrics);

        // Beta LLC invoice dated Jan 12, analyzed Feb 1 -> 20 days.
        assert!(digest.contains("20 days"));
    }

    #[test]
    fn test_empty_breakdown_sections_collapse() {
        let ledger = Ledger {
            source: "test.csv".to_string(),
            transactions: vec![Transaction {
                date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                party_name: "Acme Corp".to_string(),
                party_type: PartyType::Client,
                inflow: 100.0,
                outflow: 0.0,
                status: PaymentStatus::Paid,
                priority: Priority::Medium,
                category: "Sales".to_string(),
                notes: None,
                running_balance: 100.0,
            }],
            stats: IngestStats::default(),
        };
        let metrics = compute_metrics(&ledger, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let digest = render_digest(&metrics);

        assert!(!digest.contains("Overdue Invoices Detail"));
        assert!(!digest.contains("Pending Payables Detail"));
        assert!(digest.contains("Cash Runway: Positive cash generation (indefinite)"));
    }
}
