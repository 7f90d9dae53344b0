use axum::extract::{DefaultBodyLimit, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::state::AppState;
use crate::gateway::{ChatMessage, CompletionResult, Gateway};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Large conversation histories are posted whole.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    with_middleware(
        Router::new()
            .route("/health", get(health))
            .route("/api/chat", post(chat))
            .fallback(not_found),
    )
    .with_state(state)
}

fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let cors_layer = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer)
        .layer(CatchPanicLayer::custom(internal_error))
        .layer(TraceLayer::new_for_http())
}

fn internal_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Server error: {detail}");
    ApiError::Internal.into_response()
}

async fn health(State(gateway): State<Arc<Gateway>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "llm": gateway.connectivity().as_str(),
    }))
}

async fn chat(
    State(gateway): State<Arc<Gateway>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<CompletionResult>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let mut messages = request.history;
    messages.push(ChatMessage::user(request.message));

    let completion = gateway.chat(messages).await?;
    Ok(Json(completion))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::warn!("404 Not Found: {uri}");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "resource not found" })),
    )
}
