use std::sync::Arc;

use axum::http::StatusCode;
use log::{debug, error};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::completion::{CompletionError, CompletionProvider};
use crate::prompt::{self, TRANSCRIPT_CHAR_LIMIT};
use crate::search::{SearchError, SearchProvider};
use crate::youtube::{TranscriptError, TranscriptProvider};

/// Returned without touching any provider while `debug` is set
pub const PLACEHOLDER_SUMMARY: &str =
    "Não deu ruim. Ele pulou do prédio mas abriu o paraquedas e pousou em segurança.";

pub const DEFAULT_MAX_RESULTS: u32 = 5;
pub const DEFAULT_LANGUAGE: &str = "pt";

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default = "default_debug", deserialize_with = "lenient_debug")]
    pub debug: bool,
}

impl Default for SummaryRequest {
    fn default() -> Self {
        Self {
            thumb: String::new(),
            title: String::new(),
            channel: String::new(),
            debug: default_debug(),
        }
    }
}

fn default_debug() -> bool {
    true
}

/// Booleans pass through; of the strings, only an exact "False" turns debug off
fn lenient_debug<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::String(s)) => s != "False",
        _ => true,
    })
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("search timed out")]
    SearchTimeout,

    #[error("search provider error: {0}")]
    SearchProvider(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("no search result carried a video id")]
    NoVideoFound,

    #[error("failed to load transcript: {0}")]
    TranscriptLoad(#[source] TranscriptError),

    #[error("no transcript documents returned")]
    NoTranscriptFound,

    #[error("completion failed: {0}")]
    CompletionFailed(#[source] CompletionError),
}

impl From<SearchError> for SummaryError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Timeout => SummaryError::SearchTimeout,
            e @ SearchError::Provider { .. } => SummaryError::SearchProvider(e.to_string()),
            SearchError::Unexpected(msg) => SummaryError::Internal(msg),
        }
    }
}

impl SummaryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SummaryError::SearchTimeout => StatusCode::GATEWAY_TIMEOUT,
            SummaryError::SearchProvider(_) => StatusCode::BAD_GATEWAY,
            SummaryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SummaryError::NoVideoFound => StatusCode::NOT_FOUND,
            SummaryError::TranscriptLoad(_) => StatusCode::BAD_REQUEST,
            SummaryError::NoTranscriptFound => StatusCode::NOT_FOUND,
            SummaryError::CompletionFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// User-facing message, in Portuguese
    pub fn message(&self) -> &'static str {
        match self {
            SummaryError::SearchTimeout => {
                "A requisição à API do YouTube demorou demais e foi interrompida. Tente novamente em instantes."
            }
            SummaryError::SearchProvider(_) => {
                "Erro ao acessar a API do YouTube. Verifique a chave ou tente novamente mais tarde."
            }
            SummaryError::Internal(_) => "Erro inesperado ao processar sua solicitação.",
            SummaryError::NoVideoFound => "Nenhum vídeo encontrado para o título e canal informados.",
            SummaryError::TranscriptLoad(TranscriptError::InvalidUrl(_)) => "Endereço de vídeo inválido.",
            SummaryError::TranscriptLoad(TranscriptError::Unavailable { .. }) => {
                "A transcrição não está disponível no idioma solicitado para este vídeo."
            }
            SummaryError::TranscriptLoad(_) => "Falha ao carregar o vídeo do YouTube.",
            SummaryError::NoTranscriptFound => "Nenhuma transcrição encontrada para o vídeo.",
            SummaryError::CompletionFailed(_) => "Falha ao gerar o resumo. Tente novamente mais tarde.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    pub language: String,
    pub max_results: u32,
    pub char_limit: usize,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            char_limit: TRANSCRIPT_CHAR_LIMIT,
        }
    }
}

/// search → transcript → prompt → completion, one attempt per stage
pub struct Summarizer {
    search: Arc<dyn SearchProvider>,
    transcripts: Arc<dyn TranscriptProvider>,
    llm: Arc<dyn CompletionProvider>,
    options: SummarizerOptions,
}

impl Summarizer {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        transcripts: Arc<dyn TranscriptProvider>,
        llm: Arc<dyn CompletionProvider>,
        options: SummarizerOptions,
    ) -> Self {
        Self {
            search,
            transcripts,
            llm,
            options,
        }
    }

    pub async fn get_summary(&self, request: &SummaryRequest) -> Result<String, SummaryError> {
        debug!("[SUMMARY_DEBUG] request: {request:?}");

        if request.debug {
            return Ok(PLACEHOLDER_SUMMARY.to_string());
        }

        let query = format!("{} {}", request.title, request.channel);
        debug!("[SUMMARY_DEBUG] query: {query:?}");

        let candidates = self
            .search
            .search(&query, self.options.max_results)
            .await
            .map_err(|e| {
                error!(
                    "[SUMMARY_ERROR] search failed for title: {:?}, channel: {:?}: {e}",
                    request.title, request.channel
                );
                SummaryError::from(e)
            })?;

        let video_id = crate::select_candidate(&candidates)
            .and_then(|c| c.usable_id())
            .ok_or_else(|| {
                error!("[SUMMARY_ERROR] none of {} search results has a video id", candidates.len());
                SummaryError::NoVideoFound
            })?;
        let url = crate::watch_url(video_id);
        debug!("[SUMMARY_DEBUG] url: {url}");

        let documents = self
            .transcripts
            .fetch(&url, &self.options.language)
            .await
            .map_err(|e| {
                error!("[SUMMARY_ERROR] transcript load failed for {url}: {e:?}");
                SummaryError::TranscriptLoad(e)
            })?;

        debug!("[SUMMARY_DEBUG] documents: {}", documents.len());
        let document = documents.into_iter().next().ok_or(SummaryError::NoTranscriptFound)?;

        let messages = prompt::build_messages(&document.page_content, self.options.char_limit);

        let summary = self.llm.complete(&messages).await.map_err(|e| {
            error!("[SUMMARY_ERROR] completion failed: {e}");
            SummaryError::CompletionFailed(e)
        })?;

        debug!("[SUMMARY_DEBUG] summary: {} chars", summary.chars().count());
        Ok(summary)
    }
}
