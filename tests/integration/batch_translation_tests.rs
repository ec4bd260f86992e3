/*!
 * Multi-language batch translation tests
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheetlate::app_config::Config;
use sheetlate::providers::mock::{MockBehavior, MockProvider};
use sheetlate::translation::pipeline::ProgressCallback;
use sheetlate::translation::{BatchTranslator, FallbackPolicy, ProgressEvent, RowPipeline, Translator};
use crate::common;

fn labelled(label: &str) -> Translator {
    Translator::new(Arc::new(MockProvider::working().with_label(label)), FallbackPolicy::BatchFallback)
}

#[tokio::test]
async fn test_translate_rows_withConcurrentLanguages_shouldPreserveRowOrder() {
    let rows = common::strings(&["first", "second", "third", "fourth"]);
    let slow = MockProvider::new(MockBehavior::Slow { delay_ms: 20 }).with_label("de");
    let batch = BatchTranslator::new(RowPipeline::default(), 3);

    let results = batch
        .translate_rows(&rows, vec![
            ("German (de)".to_string(), Ok(Translator::new(Arc::new(slow), FallbackPolicy::BatchFallback))),
            ("French (fr)".to_string(), Ok(labelled("fr"))),
            ("Italian (it)".to_string(), Ok(labelled("it"))),
        ])
        .await;

    assert_eq!(results.outputs.len(), 3);
    assert_eq!(
        results.language("German (de)").unwrap(),
        ["[de] first", "[de] second", "[de] third", "[de] fourth"]
    );
    assert_eq!(results.language("Italian (it)").unwrap()[3], "[it] fourth");
    assert_eq!(results.stats["French (fr)"].calls, 4);
}

#[tokio::test]
async fn test_translate_rows_withProgress_shouldReachHundredPercent() {
    let rows = common::strings(&["a", "b"]);
    let events = Arc::new(AtomicUsize::new(0));
    let last_percent = Arc::new(parking_lot::Mutex::new(0.0));
    let (counter, last) = (Arc::clone(&events), Arc::clone(&last_percent));
    let progress: ProgressCallback = Arc::new(move |event: ProgressEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut last = last.lock();
        *last = f64::max(*last, event.percent());
    });

    let batch = BatchTranslator::new(RowPipeline::default(), 1).with_progress(progress);
    batch
        .translate_rows(&rows, vec![
            ("de".to_string(), Ok(labelled("de"))),
            ("fr".to_string(), Ok(labelled("fr"))),
        ])
        .await;

    assert_eq!(events.load(Ordering::SeqCst), 4);
    assert_eq!(*last_percent.lock(), 100.0);
}

#[tokio::test]
async fn test_translate_with_config_withLocalServer_shouldTranslateConfiguredLanguages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"translation_text": "Hallo Welt"}])))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.translation.active_backend_config_mut().endpoint = server.uri();
    let languages = common::strings(&["German (de)", "Elvish (zz)"]);

    let results = BatchTranslator::from_config(&config)
        .translate_with_config(&common::strings(&["Hello world", "DE"]), &languages, &config)
        .await;

    assert_eq!(results.language("German (de)").unwrap(), ["Hallo Welt", "DE"]);
    assert!(results.failed_languages.contains_key("Elvish (zz)"));
    assert!(!results.is_complete());
}

#[tokio::test]
async fn test_translate_with_config_withUnreachableServer_shouldFallBackToSource() {
    let mut config = Config::default();
    config.translation.active_backend_config_mut().endpoint = "http://127.0.0.1:9".to_string();
    config.translation.active_backend_config_mut().retry_count = 0;

    let results = BatchTranslator::from_config(&config)
        .translate_with_config(
            &common::strings(&["•• Save   changes", "<b>Bold</b> move"]),
            &common::strings(&["French (fr)"]),
            &config,
        )
        .await;

    assert_eq!(results.language("French (fr)").unwrap(), ["Save changes", "<b>Bold</b> move"]);
    assert_eq!(results.stats["French (fr)"].failed_units, 3);
}
