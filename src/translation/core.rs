/*!
 * Core translator implementation.
 *
 * A [`Translator`] wraps one backend for one target language and turns its
 * fallible calls into a total `units -> translations` function. How a
 * failure degrades is decided by the [`FallbackPolicy`]:
 *
 * - `BatchFallback`: one call for all units; if it fails, every unit of the
 *   call comes back as its untranslated source text.
 * - `UnitFallback`: one call per unit; a failed unit becomes an inline
 *   `[API ERROR: ...]` marker and its siblings are unaffected.
 */

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{Config, TranslationBackend};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::inference_api::InferenceApi;
use crate::providers::local::{LocalModel, normalize_base_url};
use super::cache::TranslationCache;

/// Failure-recovery granularity of a translator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Whole call reverts to the source text
    #[serde(rename = "batch")]
    BatchFallback,
    /// Single failed unit becomes an error marker
    #[serde(rename = "unit")]
    UnitFallback,
}

impl std::fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BatchFallback => write!(f, "batch"),
            Self::UnitFallback => write!(f, "unit"),
        }
    }
}

/// Inline marker emitted for a unit whose call failed under `UnitFallback`
pub fn error_marker(error: &ProviderError) -> String {
    format!("[API ERROR: {}]", error)
}

/// Counters for one translator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationStats {
    /// Backend calls issued
    pub calls: usize,
    /// Units handed to the translator
    pub units: usize,
    /// Units answered from the cache
    pub cache_hits: usize,
    /// Units that fell back to source text or an error marker
    pub failed_units: usize,
    /// Time spent waiting on the backend
    pub api_duration: Duration,
}

impl TranslationStats {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} units, {} calls, {} cached, {} failed, {:.1}s in backend",
            self.units,
            self.calls,
            self.cache_hits,
            self.failed_units,
            self.api_duration.as_secs_f64()
        )
    }
}

/// Backend plus fallback policy for one target language
#[derive(Clone)]
pub struct Translator {
    /// Backend implementation
    provider: Arc<dyn Provider>,

    /// How failures degrade
    policy: FallbackPolicy,

    /// Target language identifier, used for cache keys and logs
    language: String,

    /// Unit translation cache
    cache: TranslationCache,

    /// Shared counters
    stats: Arc<Mutex<TranslationStats>>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("provider", &self.provider)
            .field("policy", &self.policy)
            .field("language", &self.language)
            .finish()
    }
}

impl Translator {
    /// Create a translator around a backend
    pub fn new(provider: Arc<dyn Provider>, policy: FallbackPolicy) -> Self {
        Self {
            provider,
            policy,
            language: String::new(),
            cache: TranslationCache::default(),
            stats: Arc::new(Mutex::new(TranslationStats::default())),
        }
    }

    /// Set the target language label
    pub fn for_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Use a unit cache
    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    /// Build the translator for a target language from configuration
    ///
    /// Fails with [`TranslationError::Configuration`] when the language is
    /// unknown, has no model, the endpoint is not a URL, or the remote
    /// backend has no API key. No request is made.
    pub fn from_config(config: &Config, language_id: &str) -> Result<Self, TranslationError> {
        language_utils::normalize_to_part2t(language_id)
            .map_err(|e| TranslationError::configuration(language_id, e.to_string()))?;

        let model = config
            .model_for(language_id)
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| TranslationError::configuration(language_id, "no model configured for this language"))?;

        let translation = &config.translation;
        let endpoint = normalize_base_url(&translation.get_endpoint());
        Url::parse(&endpoint)
            .map_err(|e| TranslationError::configuration(language_id, format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let backend_config = translation.get_active_backend_config();
        let provider: Arc<dyn Provider> = match translation.backend {
            TranslationBackend::Local => {
                let (retry_count, retry_backoff_ms) = backend_config
                    .map(|b| (b.retry_count, b.retry_backoff_ms))
                    .unwrap_or((0, 1000));
                Arc::new(LocalModel::new_with_config(
                    &endpoint,
                    model,
                    translation.generation.clone(),
                    translation.get_timeout_secs(),
                    retry_count,
                    retry_backoff_ms,
                ))
            }
            TranslationBackend::Remote => {
                let api_key = translation.get_api_key();
                if api_key.trim().is_empty() {
                    return Err(TranslationError::configuration(
                        language_id,
                        "API key is required for the remote backend",
                    ));
                }
                Arc::new(InferenceApi::new_with_config(
                    api_key,
                    endpoint,
                    model,
                    translation.get_timeout_secs(),
                ))
            }
        };

        debug!("Translator for {}: {} backend, model {}, {} fallback",
            language_id, translation.backend, model, translation.get_fallback_policy());

        Ok(Self::new(provider, translation.get_fallback_policy())
            .for_language(language_id)
            .with_cache(TranslationCache::new(translation.cache_enabled)))
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> TranslationStats {
        self.stats.lock().clone()
    }

    /// Share of cache lookups answered from the cache, when caching is on
    pub fn cache_hit_rate(&self) -> Option<f64> {
        if !self.cache.is_enabled() {
            return None;
        }
        let (_, _, hit_rate) = self.cache.stats();
        Some(hit_rate)
    }

    /// Check that the backend is reachable
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }

    /// Translate units; always returns exactly one string per unit, in order
    pub async fn translate(&self, units: &[String]) -> Vec<String> {
        let mut results: Vec<Option<String>> = units
            .iter()
            .map(|u| self.cache.get(u, &self.language))
            .collect();
        let pending: Vec<usize> = (0..units.len()).filter(|&i| results[i].is_none()).collect();

        {
            let mut stats = self.stats.lock();
            stats.units += units.len();
            stats.cache_hits += units.len() - pending.len();
        }

        if pending.is_empty() {
            return results.into_iter().flatten().collect();
        }

        let pending_units: Vec<String> = pending.iter().map(|&i| units[i].clone()).collect();
        let translated = match self.policy {
            FallbackPolicy::BatchFallback => self.translate_with_batch_fallback(&pending_units).await,
            FallbackPolicy::UnitFallback => self.translate_with_unit_fallback(&pending_units).await,
        };

        for (index, translation) in pending.into_iter().zip(translated) {
            if let Some(text) = translation.ok {
                self.cache.store(&units[index], &self.language, &text);
                results[index] = Some(text);
            } else {
                results[index] = translation.fallback;
            }
        }

        results
            .into_iter()
            .zip(units)
            .map(|(result, unit)| result.unwrap_or_else(|| unit.clone()))
            .collect()
    }

    async fn translate_with_batch_fallback(&self, units: &[String]) -> Vec<UnitResult> {
        let start = Instant::now();
        let result = self.provider.translate_batch(units).await;
        self.record_call(start.elapsed());

        let result = result.and_then(|translations| {
            if translations.len() == units.len() {
                Ok(translations)
            } else {
                Err(ProviderError::CountMismatch { expected: units.len(), actual: translations.len() })
            }
        });

        match result {
            Ok(translations) => translations.into_iter().map(UnitResult::success).collect(),
            Err(e) => {
                warn!("Translation error ({}, {} units kept untranslated): {}", self.language, units.len(), e);
                self.stats.lock().failed_units += units.len();
                units.iter().map(|u| UnitResult::fallback(u.clone())).collect()
            }
        }
    }

    async fn translate_with_unit_fallback(&self, units: &[String]) -> Vec<UnitResult> {
        let mut results = Vec::with_capacity(units.len());
        for unit in units {
            let start = Instant::now();
            let result = self.provider.translate_one(unit).await;
            self.record_call(start.elapsed());

            match result {
                Ok(text) => results.push(UnitResult::success(text)),
                Err(e) => {
                    warn!("Translation error ({}): {}", self.language, e);
                    self.stats.lock().failed_units += 1;
                    results.push(UnitResult::fallback(error_marker(&e)));
                }
            }
        }
        results
    }

    fn record_call(&self, elapsed: Duration) {
        let mut stats = self.stats.lock();
        stats.calls += 1;
        stats.api_duration += elapsed;
    }
}

/// Outcome for one pending unit
struct UnitResult {
    ok: Option<String>,
    fallback: Option<String>,
}

impl UnitResult {
    fn success(text: String) -> Self {
        Self { ok: Some(text), fallback: None }
    }

    fn fallback(text: String) -> Self {
        Self { ok: None, fallback: Some(text) }
    }
}
