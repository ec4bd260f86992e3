/*!
 * Remote inference API client tests against a mock HTTP server
 */

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheetlate::errors::ProviderError;
use sheetlate::providers::Provider;
use sheetlate::providers::inference_api::InferenceApi;
use sheetlate::translation::{FallbackPolicy, RowPipeline, Translator};
use std::sync::Arc;

const MODEL: &str = "Helsinki-NLP/opus-mt-en-fr";

fn client(server: &MockServer) -> InferenceApi {
    InferenceApi::new_with_config("hf_test", server.uri(), MODEL, 5)
}

async fn mount_translation(server: &MockServer, input: &str, output: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/{}", MODEL)))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_json(json!({"inputs": input})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"translation_text": output}])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_translate_one_withSuccessList_shouldReturnText() {
    let server = MockServer::start().await;
    mount_translation(&server, "Hello", "Bonjour").await;

    assert_eq!(client(&server).translate_one("Hello").await.unwrap(), "Bonjour");
}

#[tokio::test]
async fn test_translate_one_withErrorObject_shouldReturnModelError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}", MODEL)))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "Model is currently loading"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).translate_one("Hello").await.unwrap_err();
    assert!(matches!(err, ProviderError::ModelError(ref m) if m == "Model is currently loading"));
}

#[tokio::test]
async fn test_translate_one_withUnauthorized_shouldReturnAuthenticationError() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
        .mount(&server)
        .await;

    let err = client(&server).translate_one("Hello").await.unwrap_err();
    assert!(matches!(err, ProviderError::AuthenticationError(_)));
}

#[tokio::test]
async fn test_translate_batch_shouldSendOneRequestPerString() {
    let server = MockServer::start().await;
    mount_translation(&server, "Hello", "Bonjour").await;
    mount_translation(&server, "world", "monde").await;

    let result = client(&server)
        .translate_batch(&["Hello".to_string(), "world".to_string()])
        .await
        .unwrap();

    assert_eq!(result, vec!["Bonjour", "monde"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_pipeline_withUnitFallback_shouldMarkOnlyFailedSpan() {
    let server = MockServer::start().await;
    mount_translation(&server, "Open", "Ouvrir").await;
    Mock::given(method("POST"))
        .and(body_json(json!({"inputs": "the file"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let translator = Translator::new(Arc::new(client(&server)), FallbackPolicy::UnitFallback);
    let result = RowPipeline::default()
        .translate_cell("Open <b>the file</b>", "French (fr)", &translator)
        .await;

    assert_eq!(result, "Ouvrir <b>[API ERROR: API responded with error: 500 - internal error]</b>");
}
