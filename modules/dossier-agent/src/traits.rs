// Trait abstraction for the pipeline's collaborator calls.
//
// ToolClient puts search, scrape, and extract behind one seam so the
// pipeline can be driven deterministically in tests with MockToolClient:
// no network, no API keys. `cargo test` in seconds.

use async_trait::async_trait;

use dossier_common::Finding;
use tools_client::{Result, ScrapeResponse, SearchHit, ToolsClient};

#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Run a web search query. Fails with `ToolError::Validation` on an
    /// empty query, before any network I/O.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    /// Fetch a page and return its readable text, truncated to `max_chars`.
    async fn scrape(&self, url: &str, max_chars: usize) -> Result<ScrapeResponse>;

    /// Extract zero-or-one finding relevant to `query` from scraped text.
    /// An empty result is success, not an error.
    async fn extract(&self, query: &str, raw_text: &str, source_url: &str)
        -> Result<Vec<Finding>>;
}

#[async_trait]
impl ToolClient for ToolsClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.search(query, max_results).await
    }

    async fn scrape(&self, url: &str, max_chars: usize) -> Result<ScrapeResponse> {
        self.scrape(url, max_chars).await
    }

    async fn extract(
        &self,
        query: &str,
        raw_text: &str,
        source_url: &str,
    ) -> Result<Vec<Finding>> {
        self.extract(query, raw_text, source_url).await
    }
}
