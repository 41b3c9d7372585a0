//! Chat handlers: ask, clear, export.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Local;
use serde::Deserialize;
use tracing::warn;

use super::super::AppState;
use super::pages::error_page;
use crate::models::ChatMessage;

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

/// Ask a question about the loaded document.
///
/// Failures are recorded in the chat as `Error: ...` rather than failing the request.
pub async fn ask(State(state): State<AppState>, Form(form): Form<AskForm>) -> Response {
    let question = form.question.trim().to_string();
    let engine = state.session.read().await.engine.clone();

    let Some(engine) = engine else {
        return error_page(
            StatusCode::BAD_REQUEST,
            "No Document",
            "No document loaded. Process a PDF or load the existing index first.",
        );
    };
    if question.is_empty() {
        return Redirect::to("/").into_response();
    }

    let reply = match engine.ask(&question).await {
        Ok(answer) => ChatMessage::assistant(answer.answer, answer.sources),
        Err(e) => {
            warn!("Question failed: {}", e);
            ChatMessage::assistant(format!("Error: {}", e), Vec::new())
        }
    };

    let mut session = state.session.write().await;
    if !session.record_exchange(&engine, question, reply) {
        warn!("Document changed while answering; discarding the reply");
    }

    Redirect::to("/").into_response()
}

pub async fn clear_chat(State(state): State<AppState>) -> Redirect {
    state.session.write().await.clear_chat();
    Redirect::to("/")
}

/// Download the chat history as a text file.
pub async fn export_chat(State(state): State<AppState>) -> Response {
    let now = Local::now();
    let Some(transcript) = state.session.read().await.export(now) else {
        return (StatusCode::NOT_FOUND, "No chat history to export").into_response();
    };

    let disposition = format!(
        "attachment; filename=\"chat_history_{}.txt\"",
        now.format("%Y%m%d_%H%M%S")
    );
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        transcript,
    )
        .into_response()
}
