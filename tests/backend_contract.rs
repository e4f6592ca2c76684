//! HTTP contract tests for the generation backend client and dispatcher.

use std::sync::Arc;
use std::time::Duration;

use neuratek::config::{BackendConfig, Endpoint};
use neuratek::models::Message;
use neuratek::providers::{BackendError, GenerateRequest, GenerationBackend, HttpBackend};
use neuratek::services::dispatcher::{Dispatcher, ERROR_TEXT, NO_RESPONSE_TEXT};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> BackendConfig {
    BackendConfig {
        base_url: Some(server.uri()),
        reply_marker: "Assistant:".to_string(),
        ..BackendConfig::default()
    }
}

fn dispatcher_for(config: &BackendConfig) -> Dispatcher {
    let backend = HttpBackend::new(config).unwrap();
    Dispatcher::new(Arc::new(backend), config)
}

#[tokio::test]
async fn test_request_carries_prompt_tokens_and_history() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask/"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "prompt": "Hello",
            "max_tokens": 1000,
            "history": [
                {"role": "user", "text": "Hi"},
                {"role": "bot", "text": "Hey", "reasoning": "Reasoning for 1 second"},
                {"role": "user", "text": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Assistant: Hi there"})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&config_for(&server));
    let history = vec![
        Message::user("Hi"),
        Message::bot("Hey", Some("Reasoning for 1 second".to_string())),
        Message::user("Hello"),
    ];

    let message = dispatcher
        .send_prompt("Hello", &history)
        .await
        .unwrap()
        .into_message();
    assert_eq!(message.text, "Hi there");
    assert!(message.reasoning.unwrap().starts_with("Reasoning for "));
}

#[tokio::test]
async fn test_generate_variant_uses_its_route_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate/"))
        .and(body_json(json!({"prompt": "x", "max_tokens": 300, "history": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "plain"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = BackendConfig {
        endpoint: Endpoint::Generate,
        ..config_for(&server)
    };
    let message = dispatcher_for(&config)
        .send_prompt("x", &[])
        .await
        .unwrap()
        .into_message();
    assert_eq!(message.text, "plain");
}

#[tokio::test]
async fn test_server_error_becomes_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Conexión Fallida"})))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&config_for(&server));
    let outcome = dispatcher.send_prompt("x", &[]).await.unwrap();
    assert!(outcome.is_failure());
    assert_eq!(outcome.into_message().text, ERROR_TEXT);
    assert!(!dispatcher.is_busy());
}

#[tokio::test]
async fn test_malformed_json_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server)).unwrap();
    let result = backend
        .generate(GenerateRequest {
            prompt: "x".to_string(),
            max_tokens: 10,
            history: Vec::new(),
        })
        .await;
    assert!(matches!(result, Err(BackendError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_missing_response_field_uses_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let message = dispatcher_for(&config_for(&server))
        .send_prompt("x", &[])
        .await
        .unwrap()
        .into_message();
    assert_eq!(message.text, NO_RESPONSE_TEXT);
}

#[tokio::test]
async fn test_slow_backend_hits_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = BackendConfig {
        request_timeout_secs: 1,
        ..config_for(&server)
    };
    let backend = HttpBackend::new(&config).unwrap();
    let result = backend
        .generate(GenerateRequest {
            prompt: "x".to_string(),
            max_tokens: 10,
            history: Vec::new(),
        })
        .await;
    assert!(matches!(result, Err(BackendError::Timeout)));
}

#[tokio::test]
async fn test_concurrent_send_is_refused() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "done"}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&config_for(&server));
    let (first, second) = tokio::join!(
        dispatcher.send_prompt("one", &[]),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            dispatcher.send_prompt("two", &[]).await
        }
    );

    assert!(first.is_some());
    assert!(second.is_none());
    assert!(!dispatcher.is_busy());
}
