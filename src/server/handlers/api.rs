//! JSON API handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use crate::qa::QaError;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Answer a question; does not touch the web chat history.
pub async fn api_ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    let Some(engine) = state.session.read().await.engine.clone() else {
        return json_error(StatusCode::CONFLICT, "No document loaded");
    };

    match engine.ask(&request.question).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => {
            let status = match e {
                QaError::EmptyQuestion | QaError::EmptyIndex => StatusCode::BAD_REQUEST,
                QaError::Llm(_) | QaError::Embed(_) => StatusCode::BAD_GATEWAY,
                QaError::Index(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            json_error(status, e.to_string())
        }
    }
}

/// Current document and model information.
pub async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let index = session.engine.as_ref().map(|engine| engine.index());

    Json(serde_json::json!({
        "loaded": index.is_some(),
        "document": session.document,
        "passages": index.map(|i| i.len()).unwrap_or(0),
        "pages": index.map(|i| i.meta.source.page_count).unwrap_or(0),
        "embedding": index.map(|i| i.meta.embedding.to_string()),
        "llm_model": state.llm.model_name(),
        "messages": session.messages.len(),
    }))
}
