/*!
 * Translation backend implementations.
 *
 * This module contains client implementations for the supported backends:
 * - LocalModel: local inference server hosting the seq2seq model, one batched request per call
 * - InferenceApi: remote HTTP inference endpoint, one request per string
 * - MockProvider: deterministic in-process backend for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all translation backends
///
/// This trait defines the interface that all backend implementations must follow,
/// allowing them to be used interchangeably behind a `Translator`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Translate all units with as few calls as the backend allows
    ///
    /// # Arguments
    /// * `units` - Source strings
    ///
    /// # Returns
    /// * `Result<Vec<String>, ProviderError>` - One translation per unit, in order, or an error
    async fn translate_batch(&self, units: &[String]) -> Result<Vec<String>, ProviderError>;

    /// Translate a single unit
    async fn translate_one(&self, unit: &str) -> Result<String, ProviderError> {
        let mut translations = self.translate_batch(&[unit.to_string()]).await?;
        match translations.len() {
            1 => Ok(translations.remove(0)),
            actual => Err(ProviderError::CountMismatch { expected: 1, actual }),
        }
    }

    /// Test the connection to the backend
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod inference_api;
pub mod local;
pub mod mock;
