use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::GenerationParameters;
use crate::errors::ProviderError;
use crate::providers::Provider;

/// Client for a local inference server hosting a seq2seq translation model
///
/// Every call sends all of its strings in one request; the server pads or
/// truncates them to the model's maximum input length and decodes with the
/// configured beam search parameters.
#[derive(Debug)]
pub struct LocalModel {
    /// Base URL of the inference server
    base_url: String,
    /// Model identifier, e.g. `Helsinki-NLP/opus-mt-en-de`
    model: String,
    /// Decoding parameters sent with every request
    parameters: GenerationParameters,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Batched translation request
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchTranslationRequest {
    /// Model to run
    pub model: String,
    /// Source strings
    pub inputs: Vec<String>,
    /// Decoding parameters
    pub parameters: GenerationParameters,
}

/// One decoded output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    /// Decoded text with special tokens removed
    pub translation_text: String,
}

/// Prefix `http://` when no scheme is given and drop trailing slashes
pub(crate) fn normalize_base_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

/// Longest wait between two attempts
const MAX_BACKOFF_MS: u64 = 60_000;

/// Exponential backoff before retry number `attempt` (1-based), capped
pub(crate) fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

impl LocalModel {
    /// Create a client with default parameters and no retries
    pub fn new(endpoint: &str, model: impl Into<String>) -> Self {
        Self::new_with_config(endpoint, model, GenerationParameters::default(), 120, 0, 1000)
    }

    /// Create a client with configuration
    pub fn new_with_config(
        endpoint: &str,
        model: impl Into<String>,
        parameters: GenerationParameters,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Self {
        Self {
            base_url: normalize_base_url(endpoint),
            model: model.into(),
            parameters,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one batched request with retry logic
    pub async fn translate(&self, inputs: &[String]) -> Result<Vec<TranslationOutput>, ProviderError> {
        let url = format!("{}/translate", self.base_url);
        let request = BatchTranslationRequest {
            model: self.model.clone(),
            inputs: inputs.to_vec(),
            parameters: self.parameters.clone(),
        };

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(&url).json(&request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await?;
                        return serde_json::from_str::<Vec<TranslationOutput>>(&body).map_err(|e| {
                            error!("Failed to parse local model response: {}. Raw response (first 500 chars): {}",
                                e, body.chars().take(500).collect::<String>());
                            ProviderError::ParseError(e.to_string())
                        });
                    }

                    let message = response.text().await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    let api_error = ProviderError::ApiError { status_code: status.as_u16(), message };
                    if !status.is_server_error() {
                        // Client error - don't retry
                        error!("Local model error: {}", api_error);
                        return Err(api_error);
                    }
                    error!("Local model error: {} - attempt {}/{}", api_error, attempt + 1, self.max_retries + 1);
                    last_error = Some(api_error);
                }
                Err(e) => {
                    error!("Local model network error: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
                    last_error = Some(ProviderError::from(e));
                }
            }

            attempt += 1;

            if attempt <= self.max_retries {
                let backoff_ms = backoff_delay_ms(self.backoff_base_ms, attempt);
                debug!("Retrying local model request in {}ms", backoff_ms);
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!("Local model request failed after {} attempts", self.max_retries + 1))
        }))
    }
}

#[async_trait]
impl Provider for LocalModel {
    fn name(&self) -> &str {
        "local"
    }

    async fn translate_batch(&self, units: &[String]) -> Result<Vec<String>, ProviderError> {
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let outputs = self.translate(units).await?;
        if outputs.len() != units.len() {
            return Err(ProviderError::CountMismatch { expected: units.len(), actual: outputs.len() });
        }

        Ok(outputs.into_iter().map(|o| o.translation_text).collect())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }
}
