//! Integration tests for [`HttpProvider`] against a wiremock endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relaygate::clock::ManualClock;
use relaygate::providers::{Dialect, HttpProvider, Provider, ProviderConfig, RetryConfig};
use relaygate::store::MemoryStore;
use relaygate::{GenerationRequest, Granularity, RelayError, UsageCounters};

fn usage() -> Arc<UsageCounters> {
    Arc::new(UsageCounters::new(
        Arc::new(MemoryStore::new()),
        Arc::new(ManualClock::new(1_700_006_400)),
    ))
}

fn fast_retry() -> RetryConfig {
    RetryConfig::new().initial_delay(Duration::from_millis(1))
}

fn gemini_body(text: &str) -> serde_json::Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
}

fn chat_body(text: &str) -> serde_json::Value {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]})
}

fn gemini_provider(server: &MockServer, usage: Arc<UsageCounters>) -> HttpProvider {
    let config = ProviderConfig::new(
        "gemini",
        format!("{}/gemini", server.uri()),
        60,
        Dialect::Gemini,
    )
    .credential("g-key");
    HttpProvider::new(config, usage, fast_retry(), Duration::from_secs(5)).unwrap()
}

// ============================================================================
// Wire format
// ============================================================================

#[tokio::test]
async fn gemini_request_shape_and_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini"))
        .and(header("Authorization", "Bearer g-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"text": "What is 2+2?"}]}],
            "generationConfig": {"maxOutputTokens": 1024, "topK": 40}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("4")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = gemini_provider(&server, usage());
    let result = provider
        .generate(&GenerationRequest::new("What is 2+2?"))
        .await
        .unwrap();

    assert_eq!(result.content, "4");
    assert_eq!(result.provider, "gemini");
    assert!(!result.cached);
}

#[tokio::test]
async fn chat_request_carries_model_and_extra_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("Authorization", "Bearer or-key"))
        .and(header("HTTP-Referer", "https://example.com"))
        .and(header("X-Title", "relaygate"))
        .and(body_partial_json(json!({
            "model": "openai/gpt-4o-mini",
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 16,
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(
        "openrouter",
        format!("{}/chat", server.uri()),
        50,
        Dialect::chat_completions("openai/gpt-4o-mini"),
    )
    .credential("or-key")
    .header("HTTP-Referer", "https://example.com")
    .header("X-Title", "relaygate");
    let provider =
        HttpProvider::new(config, usage(), fast_retry(), Duration::from_secs(5)).unwrap();

    let result = provider
        .generate(&GenerationRequest::new("hi").max_tokens(16))
        .await
        .unwrap();
    assert_eq!(result.content, "hello");
    assert_eq!(result.provider, "openrouter");
}

// ============================================================================
// Quota accounting
// ============================================================================

#[tokio::test]
async fn generate_charges_quota_once_per_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("ok")))
        .expect(3)
        .mount(&server)
        .await;

    let usage = usage();
    let provider = gemini_provider(&server, usage.clone());
    for _ in 0..3 {
        provider.generate(&GenerationRequest::new("p")).await.unwrap();
    }
    assert_eq!(usage.get_count("gemini", Granularity::Minute).await, 3);
    assert_eq!(usage.get_count("gemini", Granularity::Day).await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_generates_are_all_counted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("ok")))
        .expect(20)
        .mount(&server)
        .await;

    let usage = usage();
    let provider = Arc::new(gemini_provider(&server, usage.clone()));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..20 {
        let provider = provider.clone();
        tasks.spawn(async move {
            provider
                .generate(&GenerationRequest::new(format!("prompt {i}")))
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(usage.get_count("gemini", Granularity::Minute).await, 20);
}

#[tokio::test]
async fn failed_call_still_consumes_quota() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let usage = usage();
    let provider = gemini_provider(&server, usage.clone());
    let err = provider
        .generate(&GenerationRequest::new("p"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Api { status: 500, .. }));
    // three physical attempts, one charge
    assert_eq!(usage.get_count("gemini", Granularity::Minute).await, 1);
}

// ============================================================================
// Failure modes
// ============================================================================

#[tokio::test]
async fn missing_credential_fails_without_contacting_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("ok")))
        .expect(0)
        .mount(&server)
        .await;

    let usage = usage();
    let config = ProviderConfig::new(
        "gemini",
        format!("{}/gemini", server.uri()),
        60,
        Dialect::Gemini,
    );
    let provider =
        HttpProvider::new(config, usage.clone(), fast_retry(), Duration::from_secs(5)).unwrap();

    let err = provider
        .generate(&GenerationRequest::new("p"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::MissingCredential(ref name) if name == "gemini"));
    assert_eq!(usage.get_count("gemini", Granularity::Minute).await, 0);
}

#[tokio::test]
async fn malformed_body_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = gemini_provider(&server, usage());
    let err = provider
        .generate(&GenerationRequest::new("p"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::MalformedResponse(_)));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_body("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = ProviderConfig::new(
        "gemini",
        format!("{}/gemini", server.uri()),
        60,
        Dialect::Gemini,
    )
    .credential("g-key");
    let provider = HttpProvider::new(
        config,
        usage(),
        RetryConfig::disabled(),
        Duration::from_millis(100),
    )
    .unwrap();

    let err = provider
        .generate(&GenerationRequest::new("p"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let config = ProviderConfig::new("gemini", "http://127.0.0.1:1/gemini", 60, Dialect::Gemini)
        .credential("g-key");
    let provider = HttpProvider::new(
        config,
        usage(),
        RetryConfig::disabled(),
        Duration::from_secs(2),
    )
    .unwrap();

    let err = provider
        .generate(&GenerationRequest::new("p"))
        .await
        .unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}
