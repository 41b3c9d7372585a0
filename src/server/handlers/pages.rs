//! Page rendering handlers.

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::super::template_structs::{ErrorTemplate, IndexTemplate, MessageRow, SAMPLE_QUESTIONS};
use super::super::AppState;

/// Main page.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.write().await;
    let notice = session.take_notice();

    let (passage_count, page_count, embedding_model) = match session.engine {
        Some(ref engine) => {
            let meta = &engine.index().meta;
            (
                engine.index().len(),
                meta.source.page_count,
                meta.embedding.to_string(),
            )
        }
        None => (0, 0, String::new()),
    };

    let messages: Vec<MessageRow> = session.messages.iter().map(MessageRow::from).collect();

    let template = IndexTemplate {
        title: "Document Q&A",
        has_document: session.engine.is_some(),
        document_name: session.document.clone().unwrap_or_default(),
        passage_count,
        page_count,
        embedding_model,
        llm_model: state.llm.model_name().to_string(),
        has_notice: notice.is_some(),
        notice: notice.unwrap_or_default(),
        has_messages: !messages.is_empty(),
        messages,
        sample_questions: SAMPLE_QUESTIONS.to_vec(),
        max_upload_mb: state.config.server.max_upload_mb,
    };

    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

/// Render the error page with a status code.
pub(super) fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let template = ErrorTemplate { title, message };
    (
        status,
        Html(
            template
                .render()
                .unwrap_or_else(|e| format!("Template error: {}", e)),
        ),
    )
        .into_response()
}
