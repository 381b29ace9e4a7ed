//! HTTP contract tests for the Ollama client against a mock server.
//!
//! Covers:
//! - Non-streaming generate with timing fields
//! - NDJSON streaming generate
//! - Model presence check before generation
//! - Non-2xx status mapping
//! - Health check

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notewise_core::Error;
use notewise_inference::{collect_stream, LlmConfig, OllamaClient};

const MODEL: &str = "llama3.2:3b";

fn client_for(server: &MockServer) -> OllamaClient {
    OllamaClient::new(
        LlmConfig::default()
            .with_base_url(server.uri())
            .with_model(MODEL),
    )
    .expect("valid config")
}

async fn mount_tags(server: &MockServer, models: &[&str]) {
    let models: Vec<_> = models.iter().map(|m| json!({ "name": m, "size": 1 })).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

// ============================================================================
// GENERATE
// ============================================================================

#[tokio::test]
async fn test_generate_returns_response_and_timing() {
    let server = MockServer::start().await;
    mount_tags(&server, &[MODEL]).await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "prompt": "Summarize",
            "stream": false,
            "options": { "top_k": 40, "num_ctx": 4096 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": MODEL,
            "response": "A short summary.",
            "done": true,
            "total_duration": 1_500_000_000u64,
            "load_duration": 10_000_000u64,
            "prompt_eval_count": 8,
            "eval_count": 20,
            "eval_duration": 500_000_000u64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).generate("Summarize").await.unwrap();
    assert_eq!(response.response, "A short summary.");
    assert!(response.done);
    assert_eq!(response.prompt_eval_count, Some(8));
    assert_eq!(response.tokens_per_second(), Some(40.0));
}

#[tokio::test]
async fn test_generate_stream_yields_fragments() {
    let server = MockServer::start().await;
    mount_tags(&server, &[MODEL]).await;

    let body = concat!(
        "{\"response\":\"Hello\",\"done\":false}\n",
        "this line is not json\n",
        "{\"response\":\", world\",\"done\":false}\n",
        "{\"response\":\"\",\"done\":true,\"eval_count\":3,\"eval_duration\":300000000}\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-ndjson")
                .set_body_string(body),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let fragments: Vec<String> = client
        .generate_stream("Greet")
        .await
        .unwrap()
        .map(|f| f.unwrap().response)
        .collect()
        .await;
    assert_eq!(fragments, vec!["Hello", ", world", ""]);

    let combined = collect_stream(client.generate_stream("Greet").await.unwrap())
        .await
        .unwrap();
    assert_eq!(combined.response, "Hello, world");
    assert_eq!(combined.eval_count, Some(3));
}

// ============================================================================
// ERRORS
// ============================================================================

#[tokio::test]
async fn test_missing_model_fails_before_generate() {
    let server = MockServer::start().await;
    mount_tags(&server, &["mistral:7b"]).await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server).generate("Hi").await.unwrap_err();
    match err {
        Error::ModelNotFound(model) => assert_eq!(model, MODEL),
        other => panic!("expected ModelNotFound, got {:?}", other),
    }
    assert!(!Error::ModelNotFound(MODEL.to_string()).is_retryable());
}

#[tokio::test]
async fn test_untagged_model_matches_latest() {
    let server = MockServer::start().await;
    mount_tags(&server, &["mistral:latest"]).await;

    let client = OllamaClient::new(
        LlmConfig::default()
            .with_base_url(server.uri())
            .with_model("mistral"),
    )
    .unwrap();
    assert!(client.ensure_model().await.is_ok());
}

#[tokio::test]
async fn test_server_error_maps_status_and_message() {
    let server = MockServer::start().await;
    mount_tags(&server, &[MODEL]).await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "model crashed" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).generate("Hi").await.unwrap_err();
    match &err {
        Error::Server { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "model crashed");
        }
        other => panic!("expected Server error, got {:?}", other),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_plain_text_error_body_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_models().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Server { status: 503, ref message } if message == "overloaded"
    ));
}

// ============================================================================
// HEALTH
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    mount_tags(&server, &[MODEL]).await;
    assert!(client_for(&server).health_check().await.unwrap());

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&down)
        .await;
    assert!(!client_for(&down).health_check().await.unwrap());
}

#[tokio::test]
async fn test_list_models() {
    let server = MockServer::start().await;
    mount_tags(&server, &[MODEL, "mistral:7b"]).await;

    let models = client_for(&server).list_models().await.unwrap();
    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec![MODEL, "mistral:7b"]);
}
