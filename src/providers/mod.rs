/*!
 * Provider implementations for the language models that read dictionary pages.
 *
 * This module contains client implementations for various LLM providers:
 * - Gemini: Google Generative Language API (default)
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic Messages API
 * - Mock: scripted model for tests
 */

use async_trait::async_trait;
use log::{error, warn};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;

use crate::app_config::{ExtractionConfig, ModelProvider};
use crate::errors::ProviderError;

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;

use self::anthropic::{Anthropic, AnthropicRequest};
use self::gemini::{Gemini, GeminiRequest};
use self::ollama::{GenerationRequest, Ollama};

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably behind [`ModelClient`].
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// A model that turns one instruction into free text.
///
/// No schema is enforced here; callers parse the answer defensively.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a single prompt and return the raw answer text
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Short label for logs, e.g. `gemini/gemini-1.5-flash`
    fn label(&self) -> String;
}

/// Retry settings for transient HTTP failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry, doubled afterwards
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// A single attempt, no retries
    pub fn none() -> Self {
        Self { max_retries: 0, backoff_base_ms: 0 }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Build the shared HTTP client with a request timeout
pub(crate) fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

/// POST a JSON body and decode a JSON answer, retrying transient failures
pub(crate) async fn post_json<B, R>(
    client: &Client,
    url: &str,
    headers: &[(&str, String)],
    body: &B,
    retry: RetryPolicy,
    provider_name: &str,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized + Sync,
    R: DeserializeOwned,
{
    let mut attempt = 0;
    loop {
        match post_json_once(client, url, headers, body, provider_name).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_transient() && attempt < retry.max_retries => {
                attempt += 1;
                let delay = retry.backoff(attempt);
                warn!(
                    "{} request failed ({}), retrying in {}ms (attempt {}/{})",
                    provider_name, e, delay.as_millis(), attempt, retry.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn post_json_once<B, R>(
    client: &Client,
    url: &str,
    headers: &[(&str, String)],
    body: &B,
    provider_name: &str,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized + Sync,
    R: DeserializeOwned,
{
    let mut request = client.post(url).json(body);
    for (name, value) in headers {
        request = request.header(*name, value);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_connect() || e.is_timeout() {
            ProviderError::ConnectionError(format!("{} unreachable: {}", provider_name, e))
        } else {
            ProviderError::RequestFailed(format!("Failed to send request to {} API: {}", provider_name, e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("{} API error ({}): {}", provider_name, status, error_text);
        return Err(ProviderError::from_status(status.as_u16(), error_text));
    }

    let response_text = response.text().await
        .map_err(|e| ProviderError::RequestFailed(format!("Failed to read {} response: {}", provider_name, e)))?;

    serde_json::from_str::<R>(&response_text).map_err(|e| {
        let preview: String = response_text.chars().take(500).collect();
        ProviderError::ParseError(format!("{} response: {}. Raw response (first 500 chars): {}", provider_name, e, preview))
    })
}

/// Provider implementation variants selected from the configuration
#[derive(Debug)]
pub enum ModelClient {
    /// Google Gemini
    Gemini {
        client: Gemini,
        model: String,
        temperature: f32,
        max_tokens: u32,
    },
    /// Local Ollama server
    Ollama {
        client: Ollama,
        model: String,
        temperature: f32,
        max_tokens: u32,
    },
    /// Anthropic API
    Anthropic {
        client: Anthropic,
        model: String,
        temperature: f32,
        max_tokens: u32,
    },
}

impl ModelClient {
    /// Create the client for the active provider of the configuration
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ProviderError> {
        let endpoint = config.get_endpoint();
        url::Url::parse(&endpoint)
            .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        let model = config.get_model();
        let temperature = config.common.temperature;
        let max_tokens = config.common.max_tokens;
        let timeout_secs = config.get_timeout_secs();
        let retry = RetryPolicy {
            max_retries: config.common.retry_count,
            backoff_base_ms: config.common.retry_backoff_ms,
        };

        let client = match config.provider {
            ModelProvider::Gemini => Self::Gemini {
                client: Gemini::new_with_config(config.get_api_key(), endpoint, timeout_secs, retry),
                model,
                temperature,
                max_tokens,
            },
            ModelProvider::Ollama => Self::Ollama {
                client: Ollama::new_with_config(endpoint, timeout_secs, retry),
                model,
                temperature,
                max_tokens,
            },
            ModelProvider::Anthropic => Self::Anthropic {
                client: Anthropic::new_with_config(config.get_api_key(), endpoint, timeout_secs, retry),
                model,
                temperature,
                max_tokens,
            },
        };
        Ok(client)
    }

    /// Test the connection to the configured provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match self {
            Self::Gemini { client, .. } => client.test_connection().await,
            Self::Ollama { client, .. } => client.test_connection().await,
            Self::Anthropic { client, .. } => client.test_connection().await,
        }
    }
}

#[async_trait]
impl LanguageModel for ModelClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        match self {
            Self::Gemini { client, model, temperature, max_tokens } => {
                let request = GeminiRequest::new(model.clone())
                    .add_user_text(prompt)
                    .temperature(*temperature)
                    .max_output_tokens(*max_tokens);
                let response = client.complete(request).await?;
                Ok(Gemini::extract_text(&response))
            }
            Self::Ollama { client, model, temperature, max_tokens } => {
                let request = GenerationRequest::new(model.clone(), prompt)
                    .temperature(*temperature)
                    .num_predict(*max_tokens);
                let response = client.complete(request).await?;
                Ok(Ollama::extract_text(&response))
            }
            Self::Anthropic { client, model, temperature, max_tokens } => {
                let request = AnthropicRequest::new(model.clone(), *max_tokens)
                    .add_message("user", prompt)
                    .temperature(*temperature);
                let response = client.complete(request).await?;
                Ok(Anthropic::extract_text(&response))
            }
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Gemini { model, .. } => format!("gemini/{}", model),
            Self::Ollama { model, .. } => format!("ollama/{}", model),
            Self::Anthropic { model, .. } => format!("anthropic/{}", model),
        }
    }
}
