//! Request/response shapes for the tools API. Shared by the client here and
//! the service handlers in `dossier-tools`, so the two sides cannot drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dossier_common::Finding;

// --- search ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

// --- scrape ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub url: String,
    pub text: String,
    pub fetched_at: DateTime<Utc>,
}

// --- extract ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub query: String,
    pub raw_text: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub findings: Vec<Finding>,
}

/// Error body returned by every tools endpoint on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
