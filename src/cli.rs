//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// FinHealth - AI-powered financial health analyzer for SMEs
///
/// Analyze a transaction ledger (.csv or .xlsx) with deterministic cash-flow
/// metrics and a three-agent AI pipeline. Markdown/JSON reports, dashboard
/// datasets, optional email delivery. Built in Rust.
///
/// Examples:
///   finhealth --input ledger.xlsx
///   finhealth --input ledger.csv --model meta/llama-3.1-70b-instruct
///   finhealth --input ledger.csv --dry-run
///   finhealth --input ledger.xlsx --send-email --email owner@example.com
///   finhealth --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Ledger file to analyze (.csv or .xlsx)
    ///
    /// Must contain Date, Party Name, Cash Inflow, Cash Outflow and
    /// Payment Status columns. Not required when using --init-config.
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Directory the generated reports are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// LLM model to use for the analysis crew
    ///
    /// Any model served by the configured OpenAI-compatible endpoint.
    /// Can also be set via FINHEALTH_MODEL or .finhealth.toml.
    #[arg(short, long, env = "FINHEALTH_MODEL")]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL
    ///
    /// Defaults to the NVIDIA NIM endpoint from config.
    #[arg(long, value_name = "URL", env = "FINHEALTH_BASE_URL")]
    pub base_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    ///
    /// Lower values produce more consistent/deterministic output
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    ///
    /// How long to wait for the model per agent. Default: from config or 300s.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Combined report format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Business owner email address for report delivery
    #[arg(long, value_name = "ADDR")]
    pub email: Option<String>,

    /// Send the generated reports via the email delivery API
    ///
    /// Requires --email. Reports stay on disk whether delivery succeeds or not.
    #[arg(long, requires = "email")]
    pub send_email: bool,

    /// Dry run: ingest and compute metrics without calling the LLM
    ///
    /// Prints the data digest and writes the dashboard datasets, then exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .finhealth.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .finhealth.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Combined report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl OutputFormat {
    /// Parse a config-file format string, defaulting to Markdown.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Markdown,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate the input file
        if let Some(ref input) = self.input {
            let extension = input
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            if !matches!(extension.as_str(), "csv" | "xlsx" | "xls") {
                return Err(format!(
                    "Unsupported input format '.{}': expected .csv or .xlsx",
                    extension
                ));
            }
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        // Validate base URL format if provided
        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate temperature range if provided
        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Email delivery needs a recipient
        if self.send_email && self.email.is_none() {
            return Err("--send-email requires --email".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: None,
            output_dir: None,
            model: None,
            base_url: None,
            temperature: None,
            timeout: None,
            format: None,
            email: None,
            send_email: false,
            dry_run: false,
            init_config: false,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_validation_bad_extension() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("ledger.pdf"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_temperature_range() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        args.temperature = Some(0.3);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_send_email_requires_address() {
        let mut args = make_args();
        args.send_email = true;
        assert!(args.validate().is_err());

        args.email = Some("owner@example.com".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_base_url_scheme() {
        let mut args = make_args();
        args.base_url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());

        args.base_url = Some("https://integrate.api.nvidia.com/v1".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_output_format_from_name() {
        assert_eq!(OutputFormat::from_name("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_name("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_name("markdown"), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_name("anything"), OutputFormat::Markdown);
    }
}
