//! Completion provider against a local stub endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use docsift_core::types::Message;
use docsift_core::DocsiftError;
use docsift_llm::{GenerationOptions, Llm, LlmConfig, OllamaLlm, OpenAIProvider};

#[derive(Clone)]
struct Stub {
    hits: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
    failures: usize,
    failure_status: StatusCode,
}

impl Stub {
    fn new(failures: usize, failure_status: StatusCode) -> Self {
        Self {
            hits: Arc::new(AtomicUsize::new(0)),
            last_body: Arc::new(Mutex::new(None)),
            failures,
            failure_status,
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn chat(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    let hit = stub.hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_body.lock().unwrap() = Some(body);
    if hit < stub.failures {
        return (
            stub.failure_status,
            Json(json!({"error": {"message": "stub failure"}})),
        )
            .into_response();
    }
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": "A tidy summary."}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
    }))
    .into_response()
}

async fn serve(stub: Stub) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

fn provider(base_url: String, max_retries: usize) -> OpenAIProvider {
    OpenAIProvider::new(LlmConfig {
        api_key: Some("sk-test".into()),
        base_url: Some(base_url),
        max_retries,
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
    .with_retry_delay(Duration::from_millis(5))
}

#[tokio::test]
async fn completion_returns_content_and_usage() {
    let stub = Stub::new(0, StatusCode::OK);
    let llm = provider(serve(stub.clone()).await, 3);

    let response = llm
        .generate(
            &[Message::user("Summarize this")],
            Some(GenerationOptions {
                max_tokens: Some(256),
                temperature: None,
            }),
        )
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("A tidy summary."));
    assert_eq!(response.total_tokens(), 16);

    let body = stub.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["max_tokens"], 256);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Summarize this");
}

#[tokio::test]
async fn server_errors_are_retried() {
    let stub = Stub::new(2, StatusCode::SERVICE_UNAVAILABLE);
    let llm = provider(serve(stub.clone()).await, 3);

    let response = llm.generate(&[Message::user("hi")], None).await.unwrap();

    assert_eq!(response.content_or_empty(), "A tidy summary.");
    assert_eq!(stub.hits(), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let stub = Stub::new(usize::MAX, StatusCode::UNAUTHORIZED);
    let llm = provider(serve(stub.clone()).await, 3);

    let err = llm.generate(&[Message::user("hi")], None).await.unwrap_err();

    assert_eq!(stub.hits(), 1);
    assert!(!err.is_transient());
    assert!(err.to_string().contains("401"));
    assert!(err.to_string().contains("stub failure"));
}

#[tokio::test]
async fn retries_give_up_after_budget() {
    let stub = Stub::new(usize::MAX, StatusCode::INTERNAL_SERVER_ERROR);
    let llm = provider(serve(stub.clone()).await, 1);

    let err = llm.generate(&[Message::user("hi")], None).await.unwrap_err();

    assert_eq!(stub.hits(), 2);
    assert!(matches!(err, DocsiftError::RemoteService { status: Some(500), .. }));
}

#[tokio::test]
async fn ollama_uses_the_same_wire_format() {
    let stub = Stub::new(0, StatusCode::OK);
    let llm = OllamaLlm::new(LlmConfig {
        base_url: Some(serve(stub.clone()).await),
        ..Default::default()
    })
    .unwrap();

    let response = llm.generate(&[Message::user("hi")], None).await.unwrap();

    assert_eq!(response.content_or_empty(), "A tidy summary.");
    let body = stub.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "llama3.2");
}
