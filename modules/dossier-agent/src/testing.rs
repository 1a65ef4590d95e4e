// Test mocks for the investigation pipeline.
//
// MockToolClient matches the ToolClient trait boundary: HashMap-based
// url->page and url->findings tables, programmable failures per operation,
// and a recorded list of search queries so tests can assert on query
// construction. An optional gate lets a test hold the pipeline inside its
// first collaborator call.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use dossier_common::Finding;
use tools_client::{Result, ScrapeResponse, SearchHit, ToolError};

use crate::traits::ToolClient;

pub fn hit(url: &str) -> SearchHit {
    SearchHit {
        title: format!("result for {url}"),
        url: url.to_string(),
        snippet: "snippet".to_string(),
    }
}

pub fn finding(source: &str, link: &str, summary: &str) -> Finding {
    Finding {
        source_name: source.to_string(),
        found_at: Utc::now(),
        source_link: link.to_string(),
        summary: summary.to_string(),
    }
}

/// HashMap-based tool client. Scrape returns an error for unregistered
/// URLs; extract returns no findings for unregistered URLs (extraction
/// legitimately finds nothing on most pages).
#[derive(Default)]
pub struct MockToolClient {
    search_hits: Vec<SearchHit>,
    search_failure: Option<String>,
    pages: HashMap<String, String>,
    scrape_failures: HashMap<String, String>,
    extractions: HashMap<String, Vec<Finding>>,
    extract_failures: HashMap<String, String>,
    pub seen_queries: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl MockToolClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(mut self, hits: Vec<SearchHit>) -> Self {
        self.search_hits = hits;
        self
    }

    pub fn failing_search(mut self, message: &str) -> Self {
        self.search_failure = Some(message.to_string());
        self
    }

    pub fn on_page(mut self, url: &str, text: &str) -> Self {
        self.pages.insert(url.to_string(), text.to_string());
        self
    }

    pub fn failing_scrape(mut self, url: &str, message: &str) -> Self {
        self.scrape_failures
            .insert(url.to_string(), message.to_string());
        self
    }

    pub fn on_extract(mut self, url: &str, findings: Vec<Finding>) -> Self {
        self.extractions.insert(url.to_string(), findings);
        self
    }

    pub fn failing_extract(mut self, url: &str, message: &str) -> Self {
        self.extract_failures
            .insert(url.to_string(), message.to_string());
        self
    }

    /// Block the first search call until `release_gate` is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    fn upstream(message: &str) -> ToolError {
        ToolError::Upstream {
            status: 502,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ToolClient for MockToolClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(ToolError::Validation("Query must not be empty".to_string()));
        }
        self.seen_queries
            .lock()
            .expect("seen_queries lock")
            .push(query.to_string());

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }

        if let Some(message) = &self.search_failure {
            return Err(Self::upstream(message));
        }
        Ok(self.search_hits.iter().take(max_results).cloned().collect())
    }

    async fn scrape(&self, url: &str, max_chars: usize) -> Result<ScrapeResponse> {
        if let Some(message) = self.scrape_failures.get(url) {
            return Err(Self::upstream(message));
        }
        let text = self
            .pages
            .get(url)
            .ok_or_else(|| Self::upstream(&format!("no page registered for {url}")))?;
        Ok(ScrapeResponse {
            url: url.to_string(),
            text: text.chars().take(max_chars).collect(),
            fetched_at: Utc::now(),
        })
    }

    async fn extract(
        &self,
        _query: &str,
        _raw_text: &str,
        source_url: &str,
    ) -> Result<Vec<Finding>> {
        if let Some(message) = self.extract_failures.get(source_url) {
            return Err(Self::upstream(message));
        }
        Ok(self.extractions.get(source_url).cloned().unwrap_or_default())
    }
}
