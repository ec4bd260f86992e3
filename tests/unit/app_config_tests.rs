/*!
 * Tests for application configuration functionality
 */

use std::str::FromStr;

use sheetlate::app_config::{BackendConfig, Config, LogLevel, MAX_RETRY_COUNT, TranslationBackend};
use sheetlate::translation::FallbackPolicy;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert!(config.target_languages.is_empty());
    assert_eq!(config.languages.len(), 10);
    assert_eq!(config.translation.backend, TranslationBackend::Local);
    assert_eq!(config.translation.rows_per_request, 1);
    assert_eq!(config.translation.concurrent_languages, 1);
    assert!(!config.translation.cache_enabled);
    assert_eq!(config.input.source_column, 2);
    assert_eq!(config.input.delimiter, '\t');
    assert!(config.input.has_header);
    assert_eq!(config.skip.region_codes.len(), 9);
    assert_eq!(config.log_level, LogLevel::Info);

    let generation = &config.translation.generation;
    assert_eq!(generation.num_beams, 4);
    assert_eq!(generation.max_length, 512);
    assert!(generation.early_stopping && generation.truncation && generation.padding);
}

/// Each backend gets the fallback matching how it issues calls
#[test]
fn test_fallback_policy_withDefaultBackends_shouldFollowCallGranularity() {
    let mut config = Config::default();
    assert_eq!(config.translation.get_fallback_policy(), FallbackPolicy::BatchFallback);

    config.translation.backend = TranslationBackend::Remote;
    assert_eq!(config.translation.get_fallback_policy(), FallbackPolicy::UnitFallback);

    config.translation.active_backend_config_mut().fallback_policy = Some(FallbackPolicy::BatchFallback);
    assert_eq!(config.translation.get_fallback_policy(), FallbackPolicy::BatchFallback);
}

/// Test backend-specific endpoint and timeout lookups
#[test]
fn test_backend_settings_withDefaults_shouldResolvePerBackend() {
    let mut config = Config::default();
    assert_eq!(config.translation.get_endpoint(), "http://localhost:8080");
    assert_eq!(config.translation.get_timeout_secs(), 120);

    config.translation.backend = TranslationBackend::Remote;
    assert_eq!(config.translation.get_endpoint(), "https://api-inference.huggingface.co/models");
    assert_eq!(config.translation.get_timeout_secs(), 30);
    assert_eq!(config.translation.get_api_key(), "");
}

/// Missing backend entries are created on demand
#[test]
fn test_active_backend_config_mut_withMissingEntry_shouldCreateDefaults() {
    let mut config = Config::default();
    config.translation.available_backends.clear();
    config.translation.backend = TranslationBackend::Remote;

    config.translation.active_backend_config_mut().api_key = "secret".to_string();

    assert_eq!(config.translation.available_backends.len(), 1);
    assert_eq!(config.translation.get_api_key(), "secret");
}

/// A sparse config file is completed with defaults
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "source_language": "en",
        "target_languages": ["German (de)"],
        "translation": {
            "backend": "remote",
            "available_backends": [
                {"type": "remote", "api_key": "k", "fallback_policy": "batch"}
            ]
        },
        "lexicon": {"entries": [{"language": "ja", "token": "yes", "translation": "はい"}]}
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.translation.backend, TranslationBackend::Remote);
    assert_eq!(config.translation.get_fallback_policy(), FallbackPolicy::BatchFallback);
    assert_eq!(config.translation.get_endpoint(), "https://api-inference.huggingface.co/models");
    assert_eq!(config.languages.len(), 10);
    assert!(config.lexicon.use_defaults);
    assert_eq!(config.lexicon.entries.len(), 1);
    assert_eq!(config.input.source_column, 2);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    config.translation.rows_per_request = 0;
    assert!(config.validate().is_err());
    config.translation.rows_per_request = 5;

    config.translation.active_backend_config_mut().endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.translation.active_backend_config_mut().endpoint = "http://mt.local:9000".to_string();
    assert!(config.validate().is_ok());
}

/// Endpoints without a scheme are accepted the same way the clients accept them
#[test]
fn test_config_validation_withSchemelessEndpoint_shouldAcceptHostAndIp() {
    let mut config = Config::default();

    config.translation.active_backend_config_mut().endpoint = "127.0.0.1:8080".to_string();
    assert!(config.validate().is_ok());
    config.translation.active_backend_config_mut().endpoint = "localhost:8080/".to_string();
    assert!(config.validate().is_ok());
}

/// Unbounded retry counts are refused
#[test]
fn test_config_validation_withExcessiveRetryCount_shouldFail() {
    let mut config = Config::default();

    config.translation.active_backend_config_mut().retry_count = MAX_RETRY_COUNT;
    assert!(config.validate().is_ok());
    config.translation.active_backend_config_mut().retry_count = MAX_RETRY_COUNT + 1;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("retry_count"));
}

/// Models are found by identifier or by bare code
#[test]
fn test_model_for_withIdOrCode_shouldFindModel() {
    let config = Config::default();
    assert_eq!(config.model_for("German (de)"), Some("Helsinki-NLP/opus-mt-en-de"));
    assert_eq!(config.model_for("ja"), Some("staka/fugumt-en-ja"));
    assert_eq!(config.model_for("Korean (ko)"), None);
}

#[test]
fn test_backend_from_str_shouldBeCaseInsensitive() {
    assert_eq!(TranslationBackend::from_str("REMOTE").unwrap(), TranslationBackend::Remote);
    assert!(TranslationBackend::from_str("cloud").is_err());
    assert_eq!(BackendConfig::new(TranslationBackend::Local).retry_count, 2);
}

/// Config files round-trip through disk
#[test]
fn test_from_file_withWrittenConfig_shouldLoadSameValues() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    let mut config = Config::default();
    config.target_languages = vec!["French (fr)".to_string()];
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.target_languages, config.target_languages);
    assert_eq!(loaded.languages, config.languages);

    assert!(Config::from_file(&dir.path().join("missing.json")).is_err());
}
