//! Collaborator service for the investigation pipeline: web search, page
//! scraping, and LLM fact extraction, each behind one request/response
//! endpoint. The agent never touches the network directly; everything it
//! learns arrives through these routes.

pub mod extract;
pub mod scrape;
pub mod search;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::warn;

use dossier_common::Config;
use tools_client::{ErrorBody, ExtractRequest, ScrapeRequest, SearchRequest, SearchResponse};

pub use extract::Extractor;
pub use scrape::PageFetcher;
pub use search::SerperSearcher;

pub struct ToolsState {
    pub searcher: SerperSearcher,
    pub fetcher: PageFetcher,
    pub extractor: Extractor,
}

impl ToolsState {
    pub fn new(config: &Config) -> Self {
        Self {
            searcher: SerperSearcher::new(&config.serper_api_key),
            fetcher: PageFetcher::new(),
            extractor: Extractor::new(&config.anthropic_api_key, &config.extract_model),
        }
    }
}

pub fn router(state: Arc<ToolsState>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "ok"})) }))
        .route("/search", post(search_handler))
        .route("/scrape", post(scrape_handler))
        .route("/extract", post(extract_handler))
        .with_state(state)
}

async fn search_handler(
    State(state): State<Arc<ToolsState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    if req.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "Query must not be empty.".to_string(),
            }),
        )
            .into_response();
    }

    match state.searcher.search(&req.query, req.max_results).await {
        Ok(results) => Json(SearchResponse { results }).into_response(),
        Err(e) => {
            warn!(query = req.query.as_str(), error = %e, "Search failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: format!("Search request failed: {e}"),
                }),
            )
                .into_response()
        }
    }
}

async fn scrape_handler(
    State(state): State<Arc<ToolsState>>,
    Json(req): Json<ScrapeRequest>,
) -> impl IntoResponse {
    match state.fetcher.fetch(&req.url, req.max_chars).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => {
            warn!(url = req.url.as_str(), error = %e, "Scrape failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: format!("Scrape request failed: {e}"),
                }),
            )
                .into_response()
        }
    }
}

async fn extract_handler(
    State(state): State<Arc<ToolsState>>,
    Json(req): Json<ExtractRequest>,
) -> impl IntoResponse {
    match state
        .extractor
        .extract(&req.query, &req.raw_text, req.source_url.as_deref())
        .await
    {
        Ok(findings) => Json(tools_client::ExtractResponse { findings }).into_response(),
        Err(e) => {
            warn!(
                source_url = req.source_url.as_deref().unwrap_or("unknown-source"),
                error = %e,
                "Extraction failed"
            );
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: format!("Extract request failed: {e}"),
                }),
            )
                .into_response()
        }
    }
}
