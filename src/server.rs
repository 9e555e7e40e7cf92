use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use eyre::Result;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;

use crate::summary::{SummaryError, SummaryRequest, Summarizer};

#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Summary(#[from] SummaryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Corpo da requisição inválido.".to_string()),
            AppError::Summary(e) => (e.status_code(), e.message().to_string()),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/get-summary", post(get_summary))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler: POST /get-summary
///
/// The body is parsed as JSON whatever its content type; mobile clients send
/// `application/json; utf-8`, which is not a valid media type.
///
/// ```bash
/// curl -X POST http://127.0.0.1:8080/get-summary \
///   -d '{"title":"palestra sobre IA","channel":"Canal X","debug":false}'
/// ```
async fn get_summary(State(state): State<AppState>, body: Bytes) -> AppResult<Json<SummaryResponse>> {
    let request: SummaryRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected /get-summary body: {e}");
        AppError::BadRequest(e.to_string())
    })?;

    let summary = state.summarizer.get_summary(&request).await?;
    Ok(Json(SummaryResponse { summary }))
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::summary::tests::{MockLlm, MockSearch, MockTranscripts, SearchBehavior};
    use crate::summary::{PLACEHOLDER_SUMMARY, SummarizerOptions};

    fn app(search: MockSearch, transcripts: MockTranscripts, llm: MockLlm) -> Router {
        let summarizer = Summarizer::new(
            Arc::new(search),
            Arc::new(transcripts),
            Arc::new(llm),
            SummarizerOptions::default(),
        );
        router(AppState {
            summarizer: Arc::new(summarizer),
        })
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/get-summary")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_debug_default_returns_placeholder() {
        let app = app(
            MockSearch::new(SearchBehavior::Timeout),
            MockTranscripts::failing(),
            MockLlm::failing(),
        );
        let res = app
            .oneshot(post_json(r#"{"title":"qualquer","channel":"coisa"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["summary"], PLACEHOLDER_SUMMARY);
    }

    #[tokio::test]
    async fn test_end_to_end_summary() {
        let app = app(
            MockSearch::with_ids(&[Some("abc123")]),
            MockTranscripts::with_texts(&["texto de exemplo..."]),
            MockLlm::replying("Resumo gerado."),
        );
        let res = app
            .oneshot(post_json(
                r#"{"title":"palestra sobre IA","channel":"Canal X","debug":false}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, serde_json::json!({"summary": "Resumo gerado."}));
    }

    #[tokio::test]
    async fn test_string_false_debug_and_loose_content_type() {
        let app = app(
            MockSearch::with_ids(&[Some("abc123")]),
            MockTranscripts::with_texts(&["texto"]),
            MockLlm::replying("Resumo."),
        );
        let req = Request::builder()
            .method("POST")
            .uri("/get-summary")
            .header(header::CONTENT_TYPE, "application/json; utf-8")
            .body(Body::from(r#"{"thumb":"t","title":"a","channel":"b","debug":"False"}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["summary"], "Resumo.");
    }

    #[tokio::test]
    async fn test_search_timeout_is_504_with_message() {
        let app = app(
            MockSearch::new(SearchBehavior::Timeout),
            MockTranscripts::failing(),
            MockLlm::failing(),
        );
        let res = app.oneshot(post_json(r#"{"debug":false}"#)).await.unwrap();
        assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = json_body(res).await;
        assert!(!body["error"].as_str().unwrap().is_empty());
        assert!(body.get("summary").is_none());
    }

    #[tokio::test]
    async fn test_provider_error_is_502() {
        let app = app(
            MockSearch::new(SearchBehavior::Provider),
            MockTranscripts::failing(),
            MockLlm::failing(),
        );
        let res = app.oneshot(post_json(r#"{"debug":false}"#)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_empty_transcript_is_404() {
        let app = app(
            MockSearch::with_ids(&[Some("abc123")]),
            MockTranscripts::with_texts(&[]),
            MockLlm::failing(),
        );
        let res = app.oneshot(post_json(r#"{"debug":false}"#)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(res).await["error"],
            "Nenhuma transcrição encontrada para o vídeo."
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_400() {
        let app = app(
            MockSearch::new(SearchBehavior::Timeout),
            MockTranscripts::failing(),
            MockLlm::failing(),
        );
        let res = app.oneshot(post_json("not json")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(res).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let app = app(
            MockSearch::new(SearchBehavior::Timeout),
            MockTranscripts::failing(),
            MockLlm::failing(),
        );
        let req = Request::builder()
            .method("POST")
            .uri("/get-summary")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::from("{}"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
