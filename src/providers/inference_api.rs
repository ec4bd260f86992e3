use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::{Client, header};
use log::{debug, error};

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::local::{TranslationOutput, normalize_base_url};

/// Default hosted inference endpoint; the model id is appended as a path segment
pub const DEFAULT_INFERENCE_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

/// Client for a remote HTTP inference API
///
/// Each string is translated with its own request. There is no batching and
/// no retry; a failed request fails only that string.
#[derive(Debug)]
pub struct InferenceApi {
    /// HTTP client for API requests
    client: Client,
    /// Bearer token
    api_key: String,
    /// Endpoint URL without the model segment
    endpoint: String,
    /// Model identifier
    model: String,
}

/// Inference request body
#[derive(Debug, Serialize)]
pub struct InferenceRequest<'a> {
    /// Text to translate
    pub inputs: &'a str,
}

/// Inference response, either a list of outputs or an error object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    /// `[{"translation_text": "..."}]`
    Success(Vec<TranslationOutput>),
    /// `{"error": "..."}`
    Failure {
        /// Message reported by the API
        error: String,
    },
}

impl InferenceResponse {
    /// Text of the first output or the reported error
    pub fn into_translation(self) -> Result<String, ProviderError> {
        match self {
            Self::Success(outputs) => outputs
                .into_iter()
                .next()
                .map(|o| o.translation_text)
                .ok_or_else(|| ProviderError::ParseError("Empty translation list".to_string())),
            Self::Failure { error } => Err(ProviderError::ModelError(error)),
        }
    }
}

impl InferenceApi {
    /// Create a new inference API client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, model, 60)
    }

    /// Create a new inference API client with a request timeout
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_INFERENCE_ENDPOINT.to_string()
        } else {
            normalize_base_url(&endpoint)
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint,
            model: model.into(),
        }
    }

    /// Full request URL for the configured model
    pub fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }

    /// Translate one string
    pub async fn complete(&self, text: &str) -> Result<String, ProviderError> {
        let response = self.client.post(self.model_url())
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs: text })
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to inference API: {}", e);
                ProviderError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<InferenceResponse>(&body) {
            Ok(parsed) => parsed.into_translation(),
            Err(_) if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN => {
                Err(ProviderError::AuthenticationError(body))
            }
            Err(_) if !status.is_success() => {
                error!("Inference API error ({}): {}", status, body);
                Err(ProviderError::ApiError { status_code: status.as_u16(), message: body })
            }
            Err(e) => {
                debug!("Unparseable inference API response: {}", body);
                Err(ProviderError::ParseError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl Provider for InferenceApi {
    fn name(&self) -> &str {
        "remote"
    }

    /// Sequential per-string requests; the first failure fails the batch
    async fn translate_batch(&self, units: &[String]) -> Result<Vec<String>, ProviderError> {
        let mut translations = Vec::with_capacity(units.len());
        for unit in units {
            translations.push(self.complete(unit).await?);
        }
        Ok(translations)
    }

    async fn translate_one(&self, unit: &str) -> Result<String, ProviderError> {
        self.complete(unit).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.complete("Hello").await.map(|_| ())
    }
}
