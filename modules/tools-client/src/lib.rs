pub mod error;
pub mod wire;

pub use error::{Result, ToolError};
pub use wire::{
    ErrorBody, ExtractRequest, ExtractResponse, ScrapeRequest, ScrapeResponse, SearchHit,
    SearchRequest, SearchResponse,
};

use std::time::Duration;

use tracing::debug;

use dossier_common::Finding;

/// Per-call bound. This is the only mechanism preventing an in-flight
/// pipeline from hanging indefinitely on a collaborator.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ToolsClient {
    client: reqwest::Client,
    base_url: String,
}

impl ToolsClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(ToolError::Validation("Query must not be empty".to_string()));
        }

        debug!(query, max_results, "tools search");

        let body = SearchRequest {
            query: query.to_string(),
            max_results,
        };
        let resp: SearchResponse = self.post("search", &body).await?;
        Ok(resp.results)
    }

    pub async fn scrape(&self, url: &str, max_chars: usize) -> Result<ScrapeResponse> {
        debug!(url, max_chars, "tools scrape");

        let body = ScrapeRequest {
            url: url.to_string(),
            max_chars,
        };
        self.post("scrape", &body).await
    }

    pub async fn extract(
        &self,
        query: &str,
        raw_text: &str,
        source_url: &str,
    ) -> Result<Vec<Finding>> {
        debug!(query, source_url, chars = raw_text.len(), "tools extract");

        let body = ExtractRequest {
            query: query.to_string(),
            raw_text: raw_text.to_string(),
            source_url: Some(source_url.to_string()),
        };
        let resp: ExtractResponse = self.post("extract", &body).await?;
        Ok(resp.findings)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let endpoint = format!("{}/{path}", self.base_url);

        let resp = self.client.post(&endpoint).json(body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ToolError::Protocol(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_network_call() {
        // Unroutable base URL: a network attempt would fail differently
        let client = ToolsClient::new("http://192.0.2.1:1/tools");
        let err = client.search("   ", 5).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ToolsClient::new("http://localhost:8000/tools/");
        assert_eq!(client.base_url, "http://localhost:8000/tools");
    }

    #[test]
    fn extract_response_tolerates_empty_findings() {
        let resp: ExtractResponse = serde_json::from_str(r#"{"findings": []}"#).unwrap();
        assert!(resp.findings.is_empty());
    }

    #[test]
    fn extract_response_missing_findings_is_a_shape_error() {
        let resp = serde_json::from_str::<ExtractResponse>(r#"{"answers": []}"#);
        assert!(resp.is_err());
    }
}
