/*!
 * Mock backend implementations for testing and dry runs.
 *
 * This module provides a mock backend that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::intermittent(n)` - Every nth call fails
 * - `MockProvider::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Fails on every Nth call
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns one translation fewer than it was given
    ShortBatch,
    /// Returns an empty string for every unit
    Empty,
    /// Simulates slow response
    Slow { delay_ms: u64 },
}

/// Mock backend for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Label put in front of every translation
    label: String,
    /// Call counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Units received per call, shared between clones
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str) -> String>,
}

impl MockProvider {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            label: "TRANSLATED".to_string(),
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that drops the last translation of every batch
    pub fn short_batch() -> Self {
        Self::new(MockBehavior::ShortBatch)
    }

    /// Create a mock that returns empty translations
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set the label used by the default response
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Units received by every call, in call order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    fn respond(&self, unit: &str) -> String {
        match self.custom_response {
            Some(generator) => generator(unit),
            None => format!("[{}] {}", self.label, unit),
        }
    }

    /// Record a call and decide whether it fails
    fn begin_call(&self, units: &[String]) -> Result<(), ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(units.to_vec());

        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::Intermittent { fail_every } if count % fail_every == fail_every - 1 => {
                Err(ProviderError::ApiError {
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                    status_code: 503,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            label: self.label.clone(),
            request_count: Arc::clone(&self.request_count),
            calls: Arc::clone(&self.calls),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate_batch(&self, units: &[String]) -> Result<Vec<String>, ProviderError> {
        self.begin_call(units)?;

        if let MockBehavior::Slow { delay_ms } = self.behavior {
            tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
        }

        let mut translations: Vec<String> = match self.behavior {
            MockBehavior::Empty => units.iter().map(|_| String::new()).collect(),
            _ => units.iter().map(|u| self.respond(u)).collect(),
        };

        if self.behavior == MockBehavior::ShortBatch {
            translations.pop();
        }

        Ok(translations)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated provider failure".to_string())),
            _ => Ok(()),
        }
    }
}
