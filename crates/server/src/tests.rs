use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use booksum_core::config::OrchestratorConfig;
use booksum_core::tokenizer::WhitespaceCounter;
use booksum_core::TokenBudget;
use booksum_llm::{LlmError, LlmProvider, Message, SummaryModel};
use booksum_summarizer::{BookSummarizer, PromptTemplates};

use crate::router::build_router;
use crate::state::AppState;

// ── Helpers ───────────────────────────────────────────────────────

/// Echoes back the chunk text it was asked to summarize, or a fixed
/// intro/conclusion for the synthesis prompt.
struct EchoProvider {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl LlmProvider for EchoProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages[0].content.clone();
        self.prompts.lock().unwrap().push(prompt.clone());
        if self.fail {
            return Err(LlmError::ApiError { status: 429, body: "quota".into() });
        }
        match prompt.strip_prefix("INTRO\n") {
            Some(_) => Ok("Intro: Hello.\n\nConclusion: Goodbye.".into()),
            None => Ok(prompt.lines().skip(1).collect::<Vec<_>>().join(" ")),
        }
    }
}

fn app(fail: bool) -> (Router, Arc<EchoProvider>) {
    let provider = Arc::new(EchoProvider {
        calls: AtomicUsize::new(0),
        prompts: Mutex::new(Vec::new()),
        fail,
    });
    let primary = SummaryModel::new(
        provider.clone(),
        TokenBudget::new("gpt-4", 1500, 0.5).unwrap(),
        0.7,
    );
    let prompts =
        PromptTemplates::new("SUM {{WORD_COUNT}}\n{{CHUNK_TEXT}}", "INTRO\n{{SUMMARY_TEXT}}").unwrap();
    let summarizer = BookSummarizer::new(
        primary,
        None,
        prompts,
        Arc::new(WhitespaceCounter),
        OrchestratorConfig {
            rate_window_secs: 0,
            ..OrchestratorConfig::default()
        },
    )
    .unwrap();
    let state = Arc::new(AppState { summarizer });
    (build_router(state, "*"), provider)
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/invocations")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ── /ping ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_is_healthy() {
    let (app, _) = app(false);
    let response = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(body_string(response).await, "\n");
}

// ── /invocations ──────────────────────────────────────────────────

#[tokio::test]
async fn non_json_content_type_is_415() {
    let (app, provider) = app(false);
    let request = Request::builder()
        .method("POST")
        .uri("/invocations")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn broken_json_is_400() {
    let (app, _) = app(false);
    let response = app.oneshot(post_json("{\"text\": ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_fields_are_400() {
    let (app, _) = app(false);
    let response = app.oneshot(post_json(r#"{"doc_id": "d1"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("'text'"));
}

#[tokio::test]
async fn text_mode_returns_summary() {
    let (app, provider) = app(false);
    let response = app
        .oneshot(post_json(r#"{"text": "First paragraph here.\n\nSecond one.", "doc_id": "d1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["summary"], "First paragraph here. Second one.");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn charset_parameter_is_accepted() {
    let (app, _) = app(false);
    let request = Request::builder()
        .method("POST")
        .uri("/invocations")
        .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from(r#"{"text": "Short."}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn book_mode_sorts_chapters_and_echoes_book_id() {
    let (app, provider) = app(false);
    let body = r#"{
        "book_id": "moby-dick",
        "chapters": [
            {"id": 2, "text": "Second chapter."},
            {"id": 1, "text": "First chapter."}
        ]
    }"#;
    let response = app.oneshot(post_json(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["book_id"], "moby-dick");
    assert_eq!(body["intro"], "Hello.");
    assert_eq!(body["conclusion"], "Goodbye.");
    assert_eq!(body["summary"], "First chapter.\n\nSecond chapter.");

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0], "INTRO\nFirst chapter.\n\nSecond chapter.");
}

#[tokio::test]
async fn book_without_id_reports_unknown_id() {
    let (app, _) = app(false);
    let response = app
        .oneshot(post_json(r#"{"chapters": [{"id": 1, "text": "Only chapter."}]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["book_id"], "n/a");
    assert_eq!(body["summary"], "Only chapter.");
}

#[tokio::test]
async fn empty_chapter_list_is_422() {
    let (app, provider) = app(false);
    let response = app.oneshot(post_json(r#"{"chapters": []}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_chapter_is_400() {
    let (app, _) = app(false);
    let response = app
        .oneshot(post_json(r#"{"chapters": [{"text": "no id"}]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summarizer_failure_is_500_with_algorithm_error() {
    let (app, _) = app(true);
    let response = app.oneshot(post_json(r#"{"text": "Anything at all."}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.starts_with("Algorithm error: CapabilityFailure:"), "{body}");
    assert!(body.contains("rate limited"));
}
