use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

use crate::providers::local::normalize_base_url;
use crate::translation::core::FallbackPolicy;
use crate::translation::lexicon::LexiconEntry;
use crate::translation::skip::DEFAULT_REGION_CODES;

/// Upper bound for `retry_count` on any backend
pub const MAX_RETRY_COUNT: u32 = 16;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Selected target language identifiers, e.g. "German (de)"
    #[serde(default)]
    pub target_languages: Vec<String>,

    /// Known target languages and the model translating into each
    #[serde(default = "default_language_models")]
    pub languages: Vec<LanguageModel>,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Pass-through settings
    #[serde(default)]
    pub skip: SkipConfig,

    /// Fixed answers for exact tokens
    #[serde(default)]
    pub lexicon: LexiconConfig,

    /// Layout of the input file
    #[serde(default)]
    pub input: InputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    // @backend: Local inference server, batched calls
    #[default]
    Local,
    // @backend: Remote inference API, one call per string
    Remote,
}

impl TranslationBackend {
    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Local => "Local model",
            Self::Remote => "Inference API",
        }
    }

    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Local => "local".to_string(),
            Self::Remote => "remote".to_string(),
        }
    }

    // @returns: Fallback granularity matching how the backend issues calls
    pub fn default_fallback_policy(&self) -> FallbackPolicy {
        match self {
            Self::Local => FallbackPolicy::BatchFallback,
            Self::Remote => FallbackPolicy::UnitFallback,
        }
    }
}

impl std::fmt::Display for TranslationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// Target language and its model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LanguageModel {
    /// Display identifier, e.g. "French (fr)"
    pub id: String,
    /// Model identifier, e.g. "Helsinki-NLP/opus-mt-en-fr"
    pub model: String,
}

impl LanguageModel {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self { id: id.into(), model: model.into() }
    }
}

/// Backend configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    // @field: Backend type identifier
    #[serde(rename = "type")]
    pub backend_type: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retries for failed batched calls
    #[serde(default)]
    pub retry_count: u32,

    // @field: Base backoff between retries
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: Overrides the backend's default fallback granularity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_policy: Option<FallbackPolicy>,
}

impl BackendConfig {
    // @param backend: Backend enum
    // @returns: Backend config with defaults
    pub fn new(backend: TranslationBackend) -> Self {
        match backend {
            TranslationBackend::Local => Self {
                backend_type: "local".to_string(),
                api_key: String::new(),
                endpoint: default_local_endpoint(),
                timeout_secs: default_local_timeout_secs(),
                retry_count: default_local_retry_count(),
                retry_backoff_ms: default_retry_backoff_ms(),
                fallback_policy: None,
            },
            TranslationBackend::Remote => Self {
                backend_type: "remote".to_string(),
                api_key: String::new(),
                endpoint: default_remote_endpoint(),
                timeout_secs: default_timeout_secs(),
                retry_count: 0,
                retry_backoff_ms: default_retry_backoff_ms(),
                fallback_policy: None,
            },
        }
    }
}

/// Decoding parameters for seq2seq models
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationParameters {
    /// Beam width
    #[serde(default = "default_num_beams")]
    pub num_beams: u32,

    /// Stop a beam once it has produced an end token
    #[serde(default = "default_true")]
    pub early_stopping: bool,

    /// Maximum output length in tokens
    #[serde(default = "default_max_length")]
    pub max_length: u32,

    /// Truncate inputs longer than the model maximum
    #[serde(default = "default_true")]
    pub truncation: bool,

    /// Pad inputs of a batch to the same length
    #[serde(default = "default_true")]
    pub padding: bool,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            num_beams: default_num_beams(),
            early_stopping: true,
            max_length: default_max_length(),
            truncation: true,
            padding: true,
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: TranslationBackend,

    /// Available backends
    #[serde(default)]
    pub available_backends: Vec<BackendConfig>,

    /// Decoding parameters for the local backend
    #[serde(default)]
    pub generation: GenerationParameters,

    /// Rows whose units are sent in one translator call
    #[serde(default = "default_rows_per_request")]
    pub rows_per_request: usize,

    /// Languages translated at the same time
    #[serde(default = "default_concurrent_languages")]
    pub concurrent_languages: usize,

    /// Reuse translations of identical units within a run
    #[serde(default)]
    pub cache_enabled: bool,
}

/// Pass-through settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SkipConfig {
    /// Region codes emitted untranslated (case-insensitive)
    #[serde(default = "default_region_codes")]
    pub region_codes: Vec<String>,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self { region_codes: default_region_codes() }
    }
}

/// Lexicon settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LexiconConfig {
    /// Start from the built-in yes/no entries
    #[serde(default = "default_true")]
    pub use_defaults: bool,

    /// Additional or overriding entries
    #[serde(default)]
    pub entries: Vec<LexiconEntry>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self { use_defaults: true, entries: Vec::new() }
    }
}

/// Input file layout
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InputConfig {
    /// Zero-based index of the column holding the source text
    #[serde(default = "default_source_column")]
    pub source_column: usize,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// First record is a header row
    #[serde(default = "default_true")]
    pub has_header: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source_column: default_source_column(),
            delimiter: default_delimiter(),
            has_header: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_local_timeout_secs() -> u64 {
    120
}

fn default_local_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_num_beams() -> u32 {
    4
}

fn default_max_length() -> u32 {
    512
}

fn default_rows_per_request() -> usize {
    1
}

fn default_concurrent_languages() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_source_column() -> usize {
    2
}

fn default_delimiter() -> char {
    '\t'
}

fn default_local_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_remote_endpoint() -> String {
    crate::providers::inference_api::DEFAULT_INFERENCE_ENDPOINT.to_string()
}

fn default_region_codes() -> Vec<String> {
    DEFAULT_REGION_CODES.iter().map(|c| c.to_string()).collect()
}

/// Languages offered out of the box
pub fn default_language_models() -> Vec<LanguageModel> {
    [
        ("Arabic (ar)", "Helsinki-NLP/opus-mt-en-ar"),
        ("Chinese (zh)", "Helsinki-NLP/opus-mt-en-zh"),
        ("Dutch (nl)", "Helsinki-NLP/opus-mt-en-nl"),
        ("French (fr)", "Helsinki-NLP/opus-mt-en-fr"),
        ("German (de)", "Helsinki-NLP/opus-mt-en-de"),
        ("Hindi (hi)", "Helsinki-NLP/opus-mt-en-hi"),
        ("Italian (it)", "Helsinki-NLP/opus-mt-en-it"),
        ("Japanese (ja)", "staka/fugumt-en-ja"),
        ("Portuguese (pt)", "Helsinki-NLP/opus-mt-en-pt"),
        ("Spanish (es)", "Helsinki-NLP/opus-mt-en-es"),
    ]
    .into_iter()
    .map(|(id, model)| LanguageModel::new(id, model))
    .collect()
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Validate the settings shared by every language
    ///
    /// Per-language problems (unknown language, missing model, missing
    /// credentials) are reported when that language's translator is built.
    pub fn validate(&self) -> Result<()> {
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;

        if self.translation.rows_per_request == 0 {
            return Err(anyhow!("rows_per_request must be at least 1"));
        }
        if self.translation.concurrent_languages == 0 {
            return Err(anyhow!("concurrent_languages must be at least 1"));
        }

        let endpoint = normalize_base_url(&self.translation.get_endpoint());
        Url::parse(&endpoint)
            .with_context(|| format!("Invalid endpoint for {} backend: {}", self.translation.backend, endpoint))?;

        for backend in &self.translation.available_backends {
            if backend.retry_count > MAX_RETRY_COUNT {
                return Err(anyhow!("retry_count for '{}' must be at most {}, got {}",
                    backend.backend_type, MAX_RETRY_COUNT, backend.retry_count));
            }
        }

        for language in &self.languages {
            if language.model.trim().is_empty() {
                return Err(anyhow!("Language '{}' has no model", language.id));
            }
        }

        Ok(())
    }

    /// Model translating into the given language, matched by id or code
    pub fn model_for(&self, language_id: &str) -> Option<&str> {
        self.languages
            .iter()
            .find(|l| l.id == language_id)
            .or_else(|| {
                let code = crate::language_utils::language_code(language_id);
                self.languages
                    .iter()
                    .find(|l| crate::language_utils::language_code(&l.id) == code)
            })
            .map(|l| l.model.as_str())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_languages: Vec::new(),
            languages: default_language_models(),
            translation: TranslationConfig::default(),
            skip: SkipConfig::default(),
            lexicon: LexiconConfig::default(),
            input: InputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active backend configuration from the available_backends array
    pub fn get_active_backend_config(&self) -> Option<&BackendConfig> {
        self.get_backend_config(&self.backend)
    }

    /// Get a specific backend configuration by type
    pub fn get_backend_config(&self, backend: &TranslationBackend) -> Option<&BackendConfig> {
        let backend_str = backend.to_lowercase_string();
        self.available_backends.iter()
            .find(|b| b.backend_type == backend_str)
    }

    /// Mutable access to the active backend configuration, created with defaults if missing
    pub fn active_backend_config_mut(&mut self) -> &mut BackendConfig {
        let backend_str = self.backend.to_lowercase_string();
        let index = match self.available_backends.iter().position(|b| b.backend_type == backend_str) {
            Some(index) => index,
            None => {
                self.available_backends.push(BackendConfig::new(self.backend));
                self.available_backends.len() - 1
            }
        };
        &mut self.available_backends[index]
    }

    /// Get the API key for the active backend
    pub fn get_api_key(&self) -> String {
        self.get_active_backend_config()
            .map(|b| b.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active backend
    pub fn get_endpoint(&self) -> String {
        if let Some(backend_config) = self.get_active_backend_config() {
            if !backend_config.endpoint.is_empty() {
                return backend_config.endpoint.clone();
            }
        }

        match self.backend {
            TranslationBackend::Local => default_local_endpoint(),
            TranslationBackend::Remote => default_remote_endpoint(),
        }
    }

    /// Get the request timeout for the active backend
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_backend_config()
            .map(|b| b.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or(match self.backend {
                TranslationBackend::Local => default_local_timeout_secs(),
                TranslationBackend::Remote => default_timeout_secs(),
            })
    }

    /// Get the fallback policy for the active backend
    pub fn get_fallback_policy(&self) -> FallbackPolicy {
        self.get_active_backend_config()
            .and_then(|b| b.fallback_policy)
            .unwrap_or_else(|| self.backend.default_fallback_policy())
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackend::default(),
            available_backends: vec![
                BackendConfig::new(TranslationBackend::Local),
                BackendConfig::new(TranslationBackend::Remote),
            ],
            generation: GenerationParameters::default(),
            rows_per_request: default_rows_per_request(),
            concurrent_languages: default_concurrent_languages(),
            cache_enabled: false,
        }
    }
}
