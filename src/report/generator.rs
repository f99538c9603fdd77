//! Markdown report generation.
//!
//! This module assembles the combined financial health report from the
//! computed metrics and the agent outputs.

use crate::analysis::metrics::{share, CashFlowMetrics};
use crate::models::{format_money, AgentReport, PaymentStatus, Report, ReportMetadata};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Generate the complete Markdown report.
pub fn generate_markdown_report(report: &Report, include_digest: bool) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Financial Health Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Table of contents
    output.push_str(&generate_table_of_contents(report, include_digest));

    // Deterministic metrics
    output.push_str(&generate_metrics_section(&report.metrics));

    // Agent sections
    for agent_report in &report.agent_reports {
        output.push_str(&generate_agent_section(agent_report));
    }

    // Raw digest, collapsed
    if include_digest {
        output.push_str(&generate_digest_section(&report.digest));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source File:** `{}`\n", metadata.source_file));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !metadata.model_used.is_empty() {
        section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    }
    section.push_str(&format!(
        "- **Transactions Analyzed:** {}\n",
        metadata.transaction_count
    ));
    if metadata.rows_skipped > 0 {
        section.push_str(&format!("- **Rows Skipped:** {}\n", metadata.rows_skipped));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report, include_digest: bool) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Key Metrics](#key-metrics)\n");

    for agent_report in &report.agent_reports {
        let anchor = agent_report.title.replace([' ', '&'], "-").to_lowercase();
        toc.push_str(&format!("- [{}](#{})\n", agent_report.title, anchor));
    }

    if include_digest {
        toc.push_str("- [Data Digest](#data-digest)\n");
    }
    toc.push('\n');

    toc
}

/// Generate the deterministic metrics section.
fn generate_metrics_section(metrics: &CashFlowMetrics) -> String {
    let mut section = String::new();

    section.push_str("## Key Metrics\n\n");

    section.push_str("| Current Balance | Net Cash Flow | Daily Burn | Runway | Working Capital |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    let runway = match metrics.cash_runway_days {
        Some(days) => format!("{:.1} days", days),
        None => "indefinite".to_string(),
    };
    let ratio = match metrics.working_capital_ratio {
        Some(r) => format!("{:.2}x", r),
        None => "N/A".to_string(),
    };
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        format_money(metrics.current_balance),
        format_money(metrics.net_cash_flow),
        format_money(metrics.daily_burn_rate),
        runway,
        ratio
    ));

    // Inflow / outflow status composition
    section.push_str("### Cash Flow Composition\n\n");
    section.push_str(&format!(
        "| Direction | Total | {} Paid | {} Pending | {} Overdue |\n",
        PaymentStatus::Paid.emoji(),
        PaymentStatus::Pending.emoji(),
        PaymentStatus::Overdue.emoji(),
    ));
    section.push_str("|:---|---:|---:|---:|---:|\n");
    section.push_str(&format!(
        "| Inflows | {} | {} | {} | {} |\n",
        format_money(metrics.total_inflow),
        format_money(metrics.inflow_by_status.paid),
        format_money(metrics.inflow_by_status.pending),
        format_money(metrics.inflow_by_status.overdue),
    ));
    section.push_str(&format!(
        "| Outflows | {} | {} | {} | {} |\n\n",
        format_money(metrics.total_outflow),
        format_money(metrics.outflow_by_status.paid),
        format_money(metrics.outflow_by_status.pending),
        format_money(metrics.outflow_by_status.overdue),
    ));

    // Top counterparties
    if !metrics.top_customers.is_empty() {
        section.push_str("### Top Customers by Revenue\n\n");
        section.push_str("| # | Customer | Revenue | Share |\n");
        section.push_str("|:---:|:---|---:|---:|\n");
        for (rank, customer) in metrics.top_customers.iter().enumerate() {
            let pct = share(customer.total, metrics.total_inflow).unwrap_or(0.0);
            section.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                rank + 1,
                customer.name,
                format_money(customer.total),
                pct
            ));
        }
        section.push('\n');
    }

    if !metrics.top_vendors.is_empty() {
        section.push_str("### Top Vendors by Payables\n\n");
        section.push_str("| # | Vendor | Payables | Share |\n");
        section.push_str("|:---:|:---|---:|---:|\n");
        for (rank, vendor) in metrics.top_vendors.iter().enumerate() {
            let pct = share(vendor.total, metrics.total_outflow).unwrap_or(0.0);
            section.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                rank + 1,
                vendor.name,
                format_money(vendor.total),
                pct
            ));
        }
        section.push('\n');
    }

    // Outstanding items
    if !metrics.overdue_receivables.is_empty() {
        section.push_str("### Overdue Receivables\n\n");
        section.push_str("| Customer | Amount | Date | Days Overdue |\n");
        section.push_str("|:---|---:|:---:|---:|\n");
        for item in &metrics.overdue_receivables {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                item.party_name,
                format_money(item.amount),
                item.date.format("%Y-%m-%d"),
                item.days_outstanding
            ));
        }
        section.push('\n');
    }

    if !metrics.pending_payables.is_empty() {
        section.push_str("### Pending Payables\n\n");
        section.push_str("| Vendor | Amount | Date | Days Outstanding |\n");
        section.push_str("|:---|---:|:---:|---:|\n");
        for item in &metrics.pending_payables {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                item.party_name,
                format_money(item.amount),
                item.date.format("%Y-%m-%d"),
                item.days_outstanding
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate one agent's section.
fn generate_agent_section(agent_report: &AgentReport) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", agent_report.title));
    section.push_str(&format!(
        "*Generated by {} in {:.1}s*\n\n",
        agent_report.agent, agent_report.duration_seconds
    ));
    section.push_str(agent_report.content.trim());
    section.push_str("\n\n---\n\n");

    section
}

/// Generate the collapsed raw-digest section.
fn generate_digest_section(digest: &str) -> String {
    let mut section = String::new();

    section.push_str("## Data Digest\n\n");
    section.push_str("<details>\n<summary>View the data the agents analyzed</summary>\n\n```\n");
    section.push_str(digest);
    section.push_str("\n```\n</details>\n\n");

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by FinHealth*\n".to_string()
}

/// Write the Markdown report to a file.
pub fn write_report(report: &Report, path: &Path, include_digest: bool) -> Result<()> {
    let content = generate_markdown_report(report, include_digest);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON report to a file.
pub fn write_json_report(report: &Report, path: &Path) -> Result<()> {
    let content = generate_json_report(report)?;

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_metrics;
    use crate::models::{
        IngestStats, Ledger, PartyType, PaymentStatus, Priority, Transaction,
    };
    use chrono::{NaiveDate, Utc};

    fn create_test_report() -> Report {
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
                date: NaiveDate::from_ymd_opt(2024, 1, 18).unwrap(),
                party_name: "Beta LLC".to_string(),
                party_type: PartyType::Client,
                inflow: 3000.0,
                outflow: 0.0,
                status: PaymentStatus::Overdue,
                priority: Priority::High,
                category: "Sales".to_string(),
                notes: None,
                running_balance: 0.0,
            },
        ];
        let mut balance = 0.0;
        for t in txs.iter_mut() {
            balance += t.inflow - t.outflow;
            t.running_balance = balance;
        }
        let ledger = Ledger {
            source: "ledger.csv".to_string(),
            transactions: txs,
            stats: IngestStats::default(),
        };
        let metrics = compute_metrics(&ledger, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        Report {
            metadata: ReportMetadata {
                source_file: "ledger.csv".to_string(),
                analysis_date: Utc::now(),
                model_used: "test-model".to_string(),
                transaction_count: 2,
                rows_skipped: 0,
                duration_seconds: 42.0,
            },
            metrics,
            digest: "CASH POSITION SNAPSHOT".to_string(),
            agent_reports: vec![AgentReport {
                agent: "Cash Flow Analyst".to_string(),
                title: "Cash Flow Analysis".to_string(),
                file_name: "cash_flow_analysis.md".to_string(),
                content: "Acme Corp contributed $12,000.00 of revenue.".to_string(),
                duration_seconds: 12.5,
            }],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, true);

        assert!(markdown.contains("# Financial Health Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Key Metrics"));
        assert!(markdown.contains("## Cash Flow Analysis"));
        assert!(markdown.contains("## Data Digest"));
        assert!(markdown.contains("Acme Corp"));
        assert!(markdown.contains("`test-model`"));
    }

    #[test]
    fn test_digest_section_optional() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, false);

        assert!(!markdown.contains("## Data Digest"));
    }

    #[test]
    fn test_metrics_section_tables() {
        let report = create_test_report();
        let section = generate_metrics_section(&report.metrics);

        assert!(section.contains("### Top Customers by Revenue"));
        assert!(section.contains("| 1 | Acme Corp | $12,000.00 | 80.0% |"));
        assert!(section.contains("### Overdue Receivables"));
        assert!(section.contains("| Beta LLC | $3,000.00 | 2024-01-18 | 14 |"));
    }

    #[test]
    fn test_metadata_skips_empty_model() {
        let mut report = create_test_report();
        report.metadata.model_used = String::new();
        let section = generate_metadata_section(&report.metadata);

        assert!(!section.contains("Model Used"));
        assert!(section.contains("`ledger.csv`"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"source_file\""));
        assert!(json.contains("\"metrics\""));
        assert!(json.contains("\"agent_reports\""));
    }
}
