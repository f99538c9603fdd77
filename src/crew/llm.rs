//! Chat-completions client for OpenAI-compatible endpoints.
//!
//! The default configuration targets NVIDIA NIM, but any endpoint exposing
//! `POST {base_url}/chat/completions` works (self-hosted gateways included).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the LLM client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: u64,
    pub retries: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://integrate.api.nvidia.com/v1".to_string(),
            model: "meta/llama-3.1-405b-instruct".to_string(),
            temperature: 0.3,
            max_tokens: None,
            timeout_seconds: 300,
            retries: 3,
        }
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completions API request.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat-completions API response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// An authenticated chat-completions client.
pub struct LlmClient {
    config: LlmConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl LlmClient {
    /// Create a new client.
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            api_key,
            http_client,
        })
    }

    /// Send one system + user prompt pair and return the completion text.
    ///
    /// Transport failures (timeouts, connection errors) are retried with
    /// exponential backoff; API errors and malformed responses are not.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut attempt = 0;
        let response = loop {
            debug!(
                "Sending chat request to {} (attempt {})",
                url,
                attempt + 1
            );

            match self
                .http_client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(response) => break response,
                Err(e) if attempt < self.config.retries => {
                    let wait = Duration::from_secs(1 << attempt.min(4));
                    warn!(
                        "Transport error ({}), retrying in {:?}",
                        transport_error(&e, &self.config),
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(anyhow::anyhow!(transport_error(&e, &self.config)));
                }
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("LLM API error {}: {}", status, body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(anyhow::anyhow!("Model returned an empty completion"));
        }

        Ok(content)
    }
}

/// Human-readable description of a transport failure.
fn transport_error(e: &reqwest::Error, config: &LlmConfig) -> String {
    if e.is_timeout() {
        format!("request timed out after {}s", config.timeout_seconds)
    } else if e.is_connect() {
        format!("cannot connect to LLM endpoint at {}", config.base_url)
    } else {
        format!("failed to send request: {}", e)
    }
}
