//! FinHealth - AI-powered Financial Health Analyzer
//!
//! A CLI tool that ingests an SME transaction ledger, computes
//! deterministic cash-flow metrics, and runs a three-agent LLM crew
//! to generate cash-flow, risk, and executive reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (ingest, config, or LLM failure)
//!   2 - Reports generated but email delivery failed

mod analysis;
mod cli;
mod config;
mod crew;
mod dashboard;
mod email;
mod ledger;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use crew::{LlmClient, LlmConfig};
use email::{EmailClient, EmailConfig};
use models::{format_money, Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("FinHealth v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .finhealth.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".finhealth.toml");

    if path.exists() {
        eprintln!("⚠️  .finhealth.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .finhealth.toml")?;

    println!("✅ Created .finhealth.toml with default settings.");
    println!("   Edit it to customize model, endpoint, report format, and email delivery.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete analysis workflow. Returns exit code (0 or 2).
async fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let input = args
        .input
        .clone()
        .context("An input ledger file is required")?;

    // Step 1: Ingest the ledger
    println!("📂 Reading ledger: {}", input.display());
    let ledger = ledger::read_ledger(&input)?;

    // Step 2: Deterministic metrics
    let today = Utc::now().date_naive();
    let metrics = analysis::compute_metrics(&ledger, today);

    println!("✓ Ledger loaded successfully!");
    println!("\n📊 Quick Stats:");
    println!("   Total Transactions: {}", metrics.transaction_count);
    if ledger.stats.rows_skipped > 0 {
        println!("   Rows Skipped: {}", ledger.stats.rows_skipped);
    }
    println!("   Total Inflow: {}", format_money(metrics.total_inflow));
    println!("   Total Outflow: {}", format_money(metrics.total_outflow));
    println!("   Net Cash Flow: {}", format_money(metrics.net_cash_flow));
    println!(
        "   Current Balance: {}",
        format_money(metrics.current_balance)
    );
    println!(
        "   Overdue Invoices: {} ({})",
        metrics.overdue_receivables.len(),
        format_money(metrics.overdue_total())
    );
    println!(
        "   High Priority Pending: {}",
        metrics.high_priority_pending
    );

    // Step 3: Render the digest the agents will analyze
    let digest = analysis::render_digest(&metrics);

    let output_dir = PathBuf::from(&config.general.output_dir);
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    // Step 4: Dashboard datasets
    if config.report.dashboard {
        let dash = dashboard::build_dashboard(&ledger, &metrics);
        let dash_path = output_dir.join("dashboard.json");
        dashboard::write_dashboard(&dash, &dash_path)?;
        println!("\n📈 Dashboard datasets saved to: {}", dash_path.display());
    }

    // Handle --dry-run: print the digest and exit before any network call
    if args.dry_run {
        println!("\n🔍 Dry run: no LLM calls will be made. Data digest:\n");
        println!("{}", digest);
        println!("✅ Dry run complete.");
        return Ok(0);
    }

    // Step 5: Initialize the analysis crew
    let api_key = std::env::var(&config.model.api_key_env).with_context(|| {
        format!(
            "{} not set. Export your LLM API key before running the analysis.",
            config.model.api_key_env
        )
    })?;

    println!("\n🤖 Initializing analysis crew...");
    println!("   Model: {}", config.model.name);
    println!("   Endpoint: {}", config.model.base_url);
    println!("   Timeout: {}s per agent", config.model.timeout_seconds);

    let llm_config = LlmConfig {
        base_url: config.model.base_url.clone(),
        model: config.model.name.clone(),
        temperature: config.model.temperature,
        max_tokens: config.model.max_tokens,
        timeout_seconds: config.model.timeout_seconds,
        retries: config.model.retries,
    };
    let client = LlmClient::new(llm_config, api_key)?;

    // Step 6: Run the sequential pipeline
    println!("\n🔬 Running financial analysis...");
    println!("   👥 Crew: Cash Flow Analyst → Risk Analyst → Communications Manager\n");

    let agent_reports = crew::run_pipeline(&client, &digest, &output_dir, !args.quiet).await?;

    // Step 7: Assemble the combined report
    let duration = start_time.elapsed().as_secs_f64();
    let report = Report {
        metadata: ReportMetadata {
            source_file: input.display().to_string(),
            analysis_date: Utc::now(),
            model_used: config.model.name.clone(),
            transaction_count: ledger.transactions.len(),
            rows_skipped: ledger.stats.rows_skipped,
            duration_seconds: duration,
        },
        metrics,
        digest,
        agent_reports,
    };

    let format = OutputFormat::from_name(&config.report.format);
    let combined_path = match format {
        OutputFormat::Markdown => output_dir.join("analysis_report.md"),
        OutputFormat::Json => output_dir.join("analysis_report.json"),
    };
    match format {
        OutputFormat::Markdown => {
            report::write_report(&report, &combined_path, config.report.include_digest)?
        }
        OutputFormat::Json => report::write_json_report(&report, &combined_path)?,
    }

    // Print summary
    println!("\n📁 Output Files Generated:");
    for agent_report in &report.agent_reports {
        println!(
            "   - {} ({}, {:.1}s)",
            agent_report.file_name, agent_report.title, agent_report.duration_seconds
        );
    }
    println!(
        "   - {} (Combined Report)",
        combined_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("analysis_report")
    );
    println!(
        "\n✅ Analysis complete in {:.1}s! Reports saved to: {}",
        duration,
        output_dir.display()
    );

    // Step 8: Optional email delivery
    if args.send_email {
        let to = args
            .email
            .as_deref()
            .context("--send-email requires --email")?;

        println!("\n📧 Sending reports to {}...", to);
        if let Err(e) = deliver_reports(&config, to, &report).await {
            warn!("Email delivery failed: {}", e);
            eprintln!("\n⛔ Email delivery failed: {}", e);
            eprintln!("   The reports are still available in {}", output_dir.display());
            return Ok(2);
        }
        println!("✅ Email accepted for delivery.");
    }

    Ok(0)
}

/// Send the generated reports through the delivery API.
async fn deliver_reports(config: &Config, to: &str, report: &Report) -> Result<()> {
    let api_key = std::env::var(&config.email.api_key_env).with_context(|| {
        format!(
            "{} not set. Export your email API key to enable delivery.",
            config.email.api_key_env
        )
    })?;

    let email_config = EmailConfig {
        api_url: config.email.api_url.clone(),
        from: config.email.from.clone(),
        subject: config.email.subject.clone(),
    };

    let client = EmailClient::new(email_config, api_key)?;
    client.send_reports(to, &report.agent_reports).await
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .finhealth.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
