// tests/openai_client.rs
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use feed_herald::config::ai::{AiConfig, StageParams};
use feed_herald::enrich::client::{GenerationError, GenerationRequest, OpenAiGenerator, TextGenerator};

fn cfg(server: &MockServer, key: &str) -> AiConfig {
    AiConfig {
        base_url: format!("{}/v1", server.uri()),
        api_key: key.into(),
        ..AiConfig::default()
    }
}

fn request() -> GenerationRequest {
    GenerationRequest::new(
        "Translate the title.",
        "Why We Need to Play",
        StageParams {
            max_tokens: 200,
            temperature: 0.3,
        },
    )
}

#[tokio::test]
async fn posts_chat_completion_and_returns_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 200,
            "messages": [
                { "role": "system", "content": "Translate the title." },
                { "role": "user", "content": "Why We Need to Play" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "role": "assistant", "content": "  چرا باید بازی کنیم \n" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gen = OpenAiGenerator::new(&cfg(&server, "test-key")).unwrap();
    let out = gen.generate(&request()).await.unwrap();
    assert_eq!(out, "چرا باید بازی کنیم");
}

#[tokio::test]
async fn status_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let gen = OpenAiGenerator::new(&cfg(&server, "k")).unwrap();
    let err = gen.generate(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::RateLimited));
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let gen = OpenAiGenerator::new(&cfg(&server, "k")).unwrap();
    match gen.generate(&request()).await.unwrap_err() {
        GenerationError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

async fn reply_with(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn blank_reply_is_empty() {
    let server = reply_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [ { "message": { "content": "   " } } ]
    })))
    .await;
    let gen = OpenAiGenerator::new(&cfg(&server, "k")).unwrap();
    assert!(matches!(
        gen.generate(&request()).await.unwrap_err(),
        GenerationError::Empty
    ));
}

#[tokio::test]
async fn non_json_or_choiceless_reply_is_malformed() {
    let server = reply_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>")).await;
    let gen = OpenAiGenerator::new(&cfg(&server, "k")).unwrap();
    assert!(matches!(
        gen.generate(&request()).await.unwrap_err(),
        GenerationError::Malformed(_)
    ));

    let server = reply_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] }))).await;
    let gen = OpenAiGenerator::new(&cfg(&server, "k")).unwrap();
    assert!(matches!(
        gen.generate(&request()).await.unwrap_err(),
        GenerationError::Malformed(_)
    ));
}

#[tokio::test]
async fn missing_key_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gen = OpenAiGenerator::new(&cfg(&server, "")).unwrap();
    assert!(matches!(
        gen.generate(&request()).await.unwrap_err(),
        GenerationError::MissingApiKey
    ));
}
