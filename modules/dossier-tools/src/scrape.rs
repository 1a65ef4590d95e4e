use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

use tools_client::ScrapeResponse;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Fetches a page over plain HTTP and reduces it to readable main-content
/// markdown. No JS rendering; pages that need a browser come back thin.
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    pub async fn fetch(&self, url: &str, max_chars: usize) -> Result<ScrapeResponse> {
        let parsed = url::Url::parse(url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("Only http/https URLs are allowed, got: {}", parsed.scheme());
        }

        info!(url, "Scraping URL");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("Page request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Page returned status {status}");
        }

        let html = resp.text().await.context("Failed to read page body")?;

        let config = TransformConfig {
            readability: true,
            main_content: true,
            return_format: ReturnFormat::Markdown,
            filter_images: true,
            filter_svg: true,
            clean_html: true,
        };
        let input = TransformInput {
            url: Some(&parsed),
            content: html.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        };

        let text = transform_content_input(input, &config);

        if text.trim().is_empty() {
            warn!(url, "Empty content after Readability extraction");
        }

        let text = truncate_chars(&text, max_chars);

        info!(url, bytes = text.len(), "Scraped successfully");

        Ok(ScrapeResponse {
            url: url.to_string(),
            text,
            fetched_at: Utc::now(),
        })
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate to at most `max_chars` characters, never splitting a codepoint.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_text_is_identity() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn truncate_long_text_counts_chars() {
        let text = "a".repeat(100);
        assert_eq!(truncate_chars(&text, 60).len(), 60);
    }

    #[test]
    fn truncate_never_splits_a_codepoint() {
        let text = "héllo wörld".repeat(50);
        let cut = truncate_chars(&text, 80);
        assert_eq!(cut.chars().count(), 80);
    }
}
