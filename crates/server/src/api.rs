use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use booksum_core::{Book, UNKNOWN_DOC_ID};
use booksum_summarizer::SummarizerError;

use crate::state::AppState;

type ApiError = (StatusCode, String);

// ── Request / response bodies ─────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(default = "unknown_doc_id")]
    pub doc_id: String,
}

fn unknown_doc_id() -> String {
    UNKNOWN_DOC_ID.to_string()
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub intro: String,
    pub summary: String,
    pub conclusion: String,
    pub book_id: String,
}

// ── Health ────────────────────────────────────────────────────────

pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], "\n")
}

// ── Summarization ─────────────────────────────────────────────────

/// Summarize a single text (`{text, doc_id}`) or a whole book
/// (`{chapters: [{id, text}], book_id}`).
pub async fn invocations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<axum::response::Response, ApiError> {
    if !is_json(&headers) {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Invalid request data type, only json is supported.".to_string(),
        ));
    }

    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "request body is not valid JSON");
        (StatusCode::BAD_REQUEST, format!("Failed to decode request JSON: {e}"))
    })?;

    if payload.get("chapters").is_some() {
        let request: Book = serde_json::from_value(payload)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid book request: {e}")))?;
        return summarize_book(&state, request).await.map(IntoResponse::into_response);
    }

    if payload.get("text").is_some() {
        let request: TextRequest = serde_json::from_value(payload)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid text request: {e}")))?;
        return summarize_text(&state, request).await.map(IntoResponse::into_response);
    }

    error!("request has neither 'text' nor 'chapters'");
    Err((
        StatusCode::BAD_REQUEST,
        "The request must contain 'text' or 'chapters' field".to_string(),
    ))
}

async fn summarize_text(state: &AppState, request: TextRequest) -> Result<Json<TextResponse>, ApiError> {
    info!(doc_id = %request.doc_id, text_len = request.text.len(), "summarizing text");
    let summary = state
        .summarizer
        .summarize_text(&request.text, &request.doc_id)
        .await
        .map_err(algorithm_error)?;
    Ok(Json(TextResponse { summary }))
}

async fn summarize_book(state: &AppState, request: Book) -> Result<Json<BookResponse>, ApiError> {
    if request.chapters.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "The request must contain at least one chapter".to_string(),
        ));
    }
    info!(book_id = %request.book_id, chapters = request.chapters.len(), "summarizing book");

    let chapters = request.sorted_texts();
    let book = state
        .summarizer
        .summarize_chapters(&chapters, &request.book_id)
        .await
        .map_err(algorithm_error)?;

    Ok(Json(BookResponse {
        intro: book.intro,
        summary: book.summary,
        conclusion: book.conclusion,
        book_id: request.book_id,
    }))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn algorithm_error(err: SummarizerError) -> ApiError {
    let message = format!("Algorithm error: {}: {}", err.kind(), err);
    error!("{}", message);
    (StatusCode::INTERNAL_SERVER_ERROR, message)
}
