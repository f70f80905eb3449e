//! Relay endpoint integration tests

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::Path,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceExt;
use voice_assistant::{ApiServerBuilder, GeminiClient, TextGenerator};

mod common;
use common::{FailingGenerator, StubGenerator, spawn_relay};

/// Build a test relay router
fn build_test_router(generator: Arc<dyn TextGenerator>) -> Router {
    ApiServerBuilder::new(generator).build().router()
}

fn post_generate(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(StubGenerator::new("unused"));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_generate_returns_provider_text() {
    let generator = StubGenerator::new("Paris is the capital of France.");
    let app = build_test_router(generator.clone());

    let response = app
        .oneshot(post_generate(r#"{"prompt":"What is the capital of France?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response).await,
        br#"{"response":"Paris is the capital of France."}"#
    );
    assert_eq!(generator.prompts(), vec!["What is the capital of France?"]);
}

#[tokio::test]
async fn test_generate_missing_prompt() {
    let generator = StubGenerator::new("unused");

    for body in [r"{}", r#"{"prompt":""}"#, r#"{"prompt":null}"#, r#"{"text":"hi"}"#, ""] {
        let response = build_test_router(generator.clone())
            .oneshot(post_generate(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(body_bytes(response).await, br#"{"error":"Prompt is required"}"#);
    }

    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn test_generate_without_content_type() {
    let app = build_test_router(StubGenerator::new("unused"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, br#"{"error":"Prompt is required"}"#);
}

#[tokio::test]
async fn test_generate_provider_failure() {
    let app = build_test_router(Arc::new(FailingGenerator));

    let response = app.oneshot(post_generate(r#"{"prompt":"hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_bytes(response).await,
        br#"{"error":"Failed to generate response"}"#
    );
}

#[tokio::test]
async fn test_generate_rejects_get() {
    let app = build_test_router(StubGenerator::new("unused"));

    let response = app
        .oneshot(Request::builder().uri("/api/generate").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = build_test_router(StubGenerator::new("unused"));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/generate")
                .header("Origin", "https://client.example.com")
                .header("Access-Control-Request-Method", "POST")
                .header("Access-Control-Request-Headers", "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_static_dir_serves_client() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>AI Voice Assistant</h1>").unwrap();

    let app = ApiServerBuilder::new(StubGenerator::new("unused"))
        .static_dir(Some(dir.path().to_path_buf()))
        .build()
        .router();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"<h1>AI Voice Assistant</h1>");
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let generator = StubGenerator::new("same answer");
    let addr = spawn_relay(generator.clone()).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/generate");

    let requests = (0..8).map(|i| {
        let client = client.clone();
        let url = url.clone();
        async move {
            client
                .post(&url)
                .json(&serde_json::json!({ "prompt": format!("question {i}") }))
                .send()
                .await
                .unwrap()
                .status()
        }
    });

    let statuses = futures::future::join_all(requests).await;
    assert!(statuses.iter().all(|s| *s == reqwest::StatusCode::OK));

    let mut prompts = generator.prompts();
    prompts.sort();
    assert_eq!(prompts.len(), 8);
    assert_eq!(prompts[0], "question 0");
}

/// What the mock Gemini API saw
#[derive(Default)]
struct SeenRequest {
    path: String,
    api_key: Option<String>,
    body: serde_json::Value,
}

/// Serve a fake `generateContent` endpoint that answers with `reply`
async fn spawn_mock_gemini(
    status: StatusCode,
    reply: serde_json::Value,
) -> (String, Arc<Mutex<SeenRequest>>) {
    let seen = Arc::new(Mutex::new(SeenRequest::default()));
    let recorder = seen.clone();

    let app = Router::new().route(
        "/v1beta/models/{action}",
        post(
            move |Path(action): Path<String>, headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let recorder = recorder.clone();
                let reply = reply.clone();
                async move {
                    let mut seen = recorder.lock().await;
                    seen.path = action;
                    seen.api_key = headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(ToString::to_string);
                    seen.body = body;
                    (status, Json(reply))
                }
            },
        ),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });

    (format!("http://{addr}/v1beta"), seen)
}

fn gemini_client(base_url: &str) -> GeminiClient {
    GeminiClient::new(
        SecretString::from("test-key".to_string()),
        "gemini-1.5-flash".to_string(),
        &url::Url::parse(base_url).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_gemini_client_round_trip() {
    let (base_url, seen) = spawn_mock_gemini(
        StatusCode::OK,
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Paris is the capital of France."}]},
                "finishReason": "STOP"
            }]
        }),
    )
    .await;

    let text = tokio_test::assert_ok!(
        gemini_client(&base_url)
            .generate("What is the capital of France?")
            .await
    );
    assert_eq!(text, "Paris is the capital of France.");

    let seen = seen.lock().await;
    assert_eq!(seen.path, "gemini-1.5-flash:generateContent");
    assert_eq!(seen.api_key.as_deref(), Some("test-key"));
    assert_eq!(
        seen.body["contents"][0]["parts"][0]["text"],
        "What is the capital of France?"
    );
}

#[tokio::test]
async fn test_gemini_error_becomes_relay_500() {
    let (base_url, _seen) = spawn_mock_gemini(
        StatusCode::FORBIDDEN,
        serde_json::json!({"error": {"code": 403, "message": "API key not valid"}}),
    )
    .await;

    let client = gemini_client(&base_url);
    tokio_test::assert_err!(client.generate("hello").await);

    let app = build_test_router(Arc::new(client));
    let response = app.oneshot(post_generate(r#"{"prompt":"hello"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_bytes(response).await;
    assert_eq!(body, br#"{"error":"Failed to generate response"}"#);
}

#[tokio::test]
async fn test_gemini_malformed_response_is_error() {
    let (base_url, _seen) = spawn_mock_gemini(StatusCode::OK, serde_json::json!(["not", "a", "response"])).await;

    tokio_test::assert_err!(gemini_client(&base_url).generate("hello").await);
}
