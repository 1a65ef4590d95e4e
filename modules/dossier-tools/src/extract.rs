use anyhow::Result;
use chrono::Utc;
use claude_client::Claude;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use dossier_common::Finding;

/// What the model returns for one page: a relevance verdict and, when
/// relevant, a short factual summary.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RelevanceVerdict {
    /// Whether the scraped text contains information clearly relevant to the query.
    pub relevant: bool,
    /// 2-4 sentence factual summary of the relevant information, grounded
    /// only in the scraped text. Omitted when nothing relevant was found.
    #[serde(default)]
    pub summary: Option<String>,
}

const EXTRACTION_SYSTEM_PROMPT: &str = "\
You are an assistant for cybersecurity OSINT research. You are given a user \
query and raw text scraped from a single web page.

Rules:
1. ONLY use the scraped text as your source of information.
2. Identify information relevant to the query (phone, ID, CVE, or keyword).
3. If relevant information exists, set relevant=true and write a short, \
factual summary (2-4 sentences) of what this page says about the query.
4. Do NOT invent details that are not clearly supported by the text.
5. If you find nothing relevant, set relevant=false and omit the summary.";

pub struct Extractor {
    claude: Claude,
}

impl Extractor {
    pub fn new(anthropic_api_key: &str, model: &str) -> Self {
        Self {
            claude: Claude::new(anthropic_api_key, model),
        }
    }

    /// Extract zero-or-one finding from scraped page text. An empty result
    /// means "nothing relevant on this page", which is success.
    pub async fn extract(
        &self,
        query: &str,
        raw_text: &str,
        source_url: Option<&str>,
    ) -> Result<Vec<Finding>> {
        if raw_text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let user_prompt = format!(
            "User query: {query:?}\n\nSCRAPED TEXT STARTS BELOW:\n-------------------------\n{raw_text}\n-------------------------"
        );

        let verdict: RelevanceVerdict = self
            .claude
            .extract(EXTRACTION_SYSTEM_PROMPT, &user_prompt)
            .await?;

        let findings = verdict_to_findings(verdict, source_url);
        info!(
            source_url = source_url.unwrap_or("unknown-source"),
            count = findings.len(),
            "Extraction complete"
        );
        Ok(findings)
    }
}

/// Map a model verdict onto the wire shape: one finding when relevant, none
/// otherwise. The source host doubles as the finding's origin label.
pub(crate) fn verdict_to_findings(
    verdict: RelevanceVerdict,
    source_url: Option<&str>,
) -> Vec<Finding> {
    let summary = match (verdict.relevant, verdict.summary) {
        (true, Some(s)) if !s.trim().is_empty() => s,
        _ => return Vec::new(),
    };

    let source_name = source_url
        .and_then(|u| url::Url::parse(u).ok())
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown-source".to_string());

    vec![Finding {
        source_name,
        found_at: Utc::now(),
        source_link: source_url.unwrap_or("http://localhost/").to_string(),
        summary,
    }]
}
