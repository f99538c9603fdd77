//! Report delivery over an HTTP email API.
//!
//! Posts a single JSON payload (Resend-style: from, to, subject, text) with
//! bearer-token auth. The generated reports are concatenated into the text
//! body under per-report headers.

use crate::models::AgentReport;
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Request timeout for the delivery API.
const SEND_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for the email delivery step.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Delivery API endpoint.
    pub api_url: String,
    /// Sender address.
    pub from: String,
    /// Subject line.
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com/emails".to_string(),
            from: "reports@finhealth.local".to_string(),
            subject: "Your Financial Health Reports".to_string(),
        }
    }
}

/// Delivery API request payload.
#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

/// Client for the email delivery API.
pub struct EmailClient {
    config: EmailConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl EmailClient {
    /// Create a new delivery client.
    pub fn new(config: EmailConfig, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECONDS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            api_key,
            http_client,
        })
    }

    /// Send the generated reports to the business owner.
    pub async fn send_reports(&self, to: &str, reports: &[AgentReport]) -> Result<()> {
        let request = EmailRequest {
            from: &self.config.from,
            to,
            subject: &self.config.subject,
            text: compose_body(reports),
        };

        info!("Sending {} reports to {}", reports.len(), to);

        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Email delivery timed out after {}s", SEND_TIMEOUT_SECONDS)
                } else if e.is_connect() {
                    anyhow::anyhow!(
                        "Cannot connect to email API at {}",
                        self.config.api_url
                    )
                } else {
                    anyhow::anyhow!("Failed to send email request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Email API error {}: {}", status, body));
        }

        info!("Email accepted for delivery to {}", to);
        Ok(())
    }
}

/// Concatenate the reports into one text body.
fn compose_body(reports: &[AgentReport]) -> String {
    let mut body = String::from(
        "Hello,\n\nYour financial analysis has finished. The generated reports follow.\n",
    );

    for report in reports {
        body.push_str(&format!(
            "\n{}\n{} ({})\n{}\n\n",
            "=".repeat(60),
            report.title,
            report.file_name,
            "=".repeat(60)
        ));
        body.push_str(report.content.trim());
        body.push('\n');
    }

    body
}
