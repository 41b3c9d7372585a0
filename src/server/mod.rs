//! Web interface for asking questions about a PDF.
//!
//! One document and one conversation at a time:
//! - upload a PDF and index it in memory, or load the persisted index
//! - ask questions and see answers with the cited passages
//! - clear or export the chat history
//! - a small JSON API for scripted use

mod assets;
mod handlers;
mod routes;
mod session;
mod template_structs;

pub use routes::create_router;
pub use session::Session;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chunker::TextSplitter;
use crate::config::{Config, Settings};
use crate::embed::{create_embedder, Embedder};
use crate::extract::DocumentExtractor;
use crate::index::VectorIndex;
use crate::llm::{ChatModel, LlmClient};
use crate::pipeline::IndexingPipeline;
use crate::qa::{QaError, QueryEngine};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub settings: Arc<Settings>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn ChatModel>,
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    pub fn new(settings: &Settings, config: &Config) -> anyhow::Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let llm: Arc<dyn ChatModel> = Arc::new(LlmClient::new(config.llm.clone())?);
        Ok(Self::with_models(settings, config, embedder, llm))
    }

    /// State with explicit models, e.g. offline embedders or stub LLMs.
    pub fn with_models(
        settings: &Settings,
        config: &Config,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            config: Arc::new(config.clone()),
            settings: Arc::new(settings.clone()),
            embedder,
            llm,
            session: Arc::new(RwLock::new(Session::default())),
        }
    }

    fn pipeline(&self) -> IndexingPipeline {
        IndexingPipeline::new(
            DocumentExtractor::new(self.config.extraction.clone()),
            TextSplitter::from_config(&self.config.chunking),
            self.embedder.clone(),
        )
    }

    fn engine_for(&self, index: VectorIndex) -> Result<QueryEngine, QaError> {
        Ok(QueryEngine::new(
            Arc::new(index),
            self.embedder.clone(),
            self.llm.clone(),
            self.config.retrieval.clone(),
        )?
        .with_prompt(self.config.llm.get_qa_prompt()))
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let state = AppState::new(settings, config)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::tempdir;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use crate::embed::HashingEmbedder;
    use crate::index::{IndexMeta, SourceInfo};
    use crate::llm::LlmError;
    use crate::models::{ContentKind, Passage};

    struct StubModel {
        fail: bool,
    }

    #[async_trait]
    impl ChatModel for StubModel {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            if self.fail {
                Err(LlmError::Api("HTTP 503: overloaded".to_string()))
            } else {
                Ok("The budget was 4.2 million.".to_string())
            }
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn setup_state(dir: &tempfile::TempDir, fail: bool) -> AppState {
        let settings = Settings::with_data_dir(dir.path().to_path_buf());
        AppState::with_models(
            &settings,
            &Config::default(),
            Arc::new(HashingEmbedder::new(128)),
            Arc::new(StubModel { fail }),
        )
    }

    fn sample_index(embedder: &HashingEmbedder) -> VectorIndex {
        let texts = [
            (2, "The annual budget was 4.2 million dollars."),
            (6, "Staff headcount grew to 120 people."),
        ];
        let passages = texts
            .iter()
            .enumerate()
            .map(|(i, (page, text))| Passage {
                id: Passage::make_id(*page, ContentKind::Text, i),
                text: text.to_string(),
                page: *page,
                kind: ContentKind::Text,
                embedding: embedder.embed_text(text),
            })
            .collect();
        let meta = IndexMeta::new(
            SourceInfo {
                file_name: "budget.pdf".to_string(),
                sha256: String::new(),
                page_count: 8,
            },
            embedder.fingerprint(),
        );
        VectorIndex::build(meta, passages).unwrap()
    }

    async fn load_sample(state: &AppState) {
        let engine = state
            .engine_for(sample_index(&HashingEmbedder::new(128)))
            .unwrap();
        state
            .session
            .write()
            .await
            .load("budget.pdf".to_string(), engine, "Loaded".to_string());
    }

    async fn body_string(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_page_without_document() {
        let dir = tempdir().unwrap();
        let app = create_router(setup_state(&dir, false));

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Process Document"));
        assert!(html.contains("Load Existing Document"));
    }

    #[tokio::test]
    async fn test_ask_without_document() {
        let dir = tempdir().unwrap();
        let app = create_router(setup_state(&dir, false));

        let response = app
            .oneshot(post_form("/ask", "question=What+is+this%3F"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("No document loaded"));
    }

    #[tokio::test]
    async fn test_ask_appends_answer_with_sources() {
        let dir = tempdir().unwrap();
        let state = setup_state(&dir, false);
        load_sample(&state).await;
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_form("/ask", "question=What+was+the+budget%3F"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        {
            let session = state.session.read().await;
            assert_eq!(session.messages.len(), 2);
            assert_eq!(session.messages[0].content, "What was the budget?");
            assert_eq!(session.messages[1].content, "The budget was 4.2 million.");
            assert!(!session.messages[1].sources.is_empty());
        }

        let html = body_string(app.oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("The budget was 4.2 million."));
        assert!(html.contains("Page 2"));
        assert!(html.contains("[1]"));
    }

    /// Signals when a completion starts and waits to be released.
    struct GatedModel {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ChatModel for GatedModel {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("Answer about budget.pdf".to_string())
        }

        fn model_name(&self) -> &str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_reply_dropped_when_document_changes_mid_answer() {
        let dir = tempdir().unwrap();
        let model = Arc::new(GatedModel {
            started: Notify::new(),
            release: Notify::new(),
        });
        let state = AppState::with_models(
            &Settings::with_data_dir(dir.path().to_path_buf()),
            &Config::default(),
            Arc::new(HashingEmbedder::new(128)),
            model.clone(),
        );
        load_sample(&state).await;
        let app = create_router(state.clone());

        let pending = tokio::spawn(app.oneshot(post_form("/ask", "question=budget")));
        model.started.notified().await;

        let engine = state
            .engine_for(sample_index(&HashingEmbedder::new(128)))
            .unwrap();
        state
            .session
            .write()
            .await
            .load("other.pdf".to_string(), engine, "Loaded".to_string());
        model.release.notify_one();

        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let session = state.session.read().await;
        assert_eq!(session.document.as_deref(), Some("other.pdf"));
        assert!(session.messages.is_empty());
    }

    #[tokio::test]
    async fn test_failed_question_becomes_error_message() {
        let dir = tempdir().unwrap();
        let state = setup_state(&dir, true);
        load_sample(&state).await;
        let app = create_router(state.clone());

        let response = app
            .oneshot(post_form("/ask", "question=budget"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let session = state.session.read().await;
        assert_eq!(session.messages.len(), 2);
        assert!(session.messages[1].content.starts_with("Error: "));
        assert!(session.messages[1].sources.is_empty());
    }

    #[tokio::test]
    async fn test_export_and_clear_chat() {
        let dir = tempdir().unwrap();
        let state = setup_state(&dir, false);
        load_sample(&state).await;
        let app = create_router(state.clone());

        let response = app.clone().oneshot(get("/chat/export")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        app.clone()
            .oneshot(post_form("/ask", "question=budget"))
            .await
            .unwrap();

        let response = app.clone().oneshot(get("/chat/export")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"chat_history_"));
        let text = body_string(response).await;
        assert!(text.contains("Document: budget.pdf"));
        assert!(text.contains("You: budget"));

        let response = app
            .oneshot(post_form("/chat/clear", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(state.session.read().await.messages.is_empty());
    }

    #[tokio::test]
    async fn test_api_ask() {
        let dir = tempdir().unwrap();
        let state = setup_state(&dir, false);
        load_sample(&state).await;
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ask")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"question":"How many staff?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["answer"], "The budget was 4.2 million.");
        for page in json["pages"].as_array().unwrap() {
            assert!([2, 6].contains(&page.as_u64().unwrap()));
        }
    }

    #[tokio::test]
    async fn test_api_ask_rejects_empty_question() {
        let dir = tempdir().unwrap();
        let state = setup_state(&dir, false);
        load_sample(&state).await;
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ask")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"question":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_status() {
        let dir = tempdir().unwrap();
        let state = setup_state(&dir, false);
        let app = create_router(state.clone());

        let json: serde_json::Value =
            serde_json::from_str(&body_string(app.clone().oneshot(get("/api/status")).await.unwrap()).await)
                .unwrap();
        assert_eq!(json["loaded"], false);

        load_sample(&state).await;
        let json: serde_json::Value =
            serde_json::from_str(&body_string(app.oneshot(get("/api/status")).await.unwrap()).await)
                .unwrap();
        assert_eq!(json["loaded"], true);
        assert_eq!(json["document"], "budget.pdf");
        assert_eq!(json["passages"], 2);
        assert_eq!(json["llm_model"], "stub");
    }

    #[tokio::test]
    async fn test_process_rejects_non_pdf() {
        let dir = tempdir().unwrap();
        let app = create_router(setup_state(&dir, false));

        let boundary = "docqa-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.pdf\"\r\nContent-Type: application/pdf\r\n\r\njust some text\r\n--{b}--\r\n",
            b = boundary
        );
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/process")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("not a PDF"));
    }

    #[tokio::test]
    async fn test_load_without_index() {
        let dir = tempdir().unwrap();
        let app = create_router(setup_state(&dir, false));

        let response = app.oneshot(post_form("/load", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("No index found"));
    }

    #[tokio::test]
    async fn test_load_persisted_index() {
        let dir = tempdir().unwrap();
        let state = setup_state(&dir, false);
        sample_index(&HashingEmbedder::new(128))
            .save(&state.settings.index_dir)
            .unwrap();
        let app = create_router(state.clone());

        let response = app.clone().oneshot(post_form("/load", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            state.session.read().await.document.as_deref(),
            Some("budget.pdf")
        );

        let html = body_string(app.oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("budget.pdf"));
        assert!(html.contains("What is this document about?"));
    }

    #[tokio::test]
    async fn test_static_css() {
        let dir = tempdir().unwrap();
        let app = create_router(setup_state(&dir, false));

        let response = app.oneshot(get("/static/style.css")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    }
}
