/*!
 * Local inference server client tests against a mock HTTP server
 */

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheetlate::app_config::GenerationParameters;
use sheetlate::errors::ProviderError;
use sheetlate::providers::Provider;
use sheetlate::providers::local::LocalModel;
use crate::common;

const MODEL: &str = "Helsinki-NLP/opus-mt-en-de";

fn client(server: &MockServer, retries: u32) -> LocalModel {
    LocalModel::new_with_config(&server.uri(), MODEL, GenerationParameters::default(), 5, retries, 10)
}

#[tokio::test]
async fn test_translate_batch_withSuccessfulResponse_shouldSendOneBatchedRequest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "inputs": ["Hello", "world"],
            "parameters": {"num_beams": 4, "early_stopping": true, "max_length": 512, "truncation": true, "padding": true}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"translation_text": "Hallo"},
            {"translation_text": "Welt"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, 0)
        .translate_batch(&common::strings(&["Hello", "world"]))
        .await
        .unwrap();

    assert_eq!(result, common::strings(&["Hallo", "Welt"]));
}

#[tokio::test]
async fn test_translate_batch_withShortResponse_shouldReportCountMismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"translation_text": "Hallo"}])))
        .mount(&server)
        .await;

    let err = client(&server, 0)
        .translate_batch(&common::strings(&["Hello", "world"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::CountMismatch { expected: 2, actual: 1 }));
}

#[tokio::test]
async fn test_translate_batch_withServerError_shouldRetryThenFail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, 2)
        .translate_batch(&common::strings(&["Hello"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ApiError { status_code: 503, .. }));
}

#[tokio::test]
async fn test_translate_batch_withClientError_shouldNotRetry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(422).set_body_string("unknown model"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3)
        .translate_batch(&common::strings(&["Hello"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::ApiError { status_code: 422, ref message } if message == "unknown model"));
}

#[tokio::test]
async fn test_translate_batch_withMalformedBody_shouldReturnParseError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client(&server, 0).translate_batch(&common::strings(&["Hello"])).await.unwrap_err();
    assert!(matches!(err, ProviderError::ParseError(_)));
}

#[tokio::test]
async fn test_translate_batch_withNoUnits_shouldNotSendRequest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server, 0).translate_batch(&[]).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_test_connection_shouldUseHealthEndpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client(&server, 0).test_connection().await.is_ok());

    let unreachable = LocalModel::new("http://127.0.0.1:9", MODEL);
    assert!(unreachable.test_connection().await.is_err());
}
