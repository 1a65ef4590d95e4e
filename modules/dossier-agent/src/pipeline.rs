//! The pipeline driver: one strictly sequential search -> scrape -> extract
//! run per task, with the task record's state machine and progress log
//! updated at every step.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use dossier_common::{Finding, QueryPayload, TaskState};

use crate::dedup::deduplicate_findings;
use crate::store::{StoreError, TaskStore, TaskUpdate};
use crate::traits::ToolClient;

/// Candidate results requested per search.
pub const MAX_SEARCH_RESULTS: usize = 5;
/// Page text budget handed to extraction.
pub const SCRAPE_MAX_CHARS: usize = 6000;
/// Query used when every payload field is empty.
pub const FALLBACK_QUERY: &str = "cybersecurity osint";

pub struct PipelineRunner {
    store: TaskStore,
    tools: Arc<dyn ToolClient>,
}

impl PipelineRunner {
    pub fn new(store: TaskStore, tools: Arc<dyn ToolClient>) -> Self {
        Self { store, tools }
    }

    /// Drive one task to a terminal state. Every failure inside the run is
    /// converted to `Failed` here; nothing escapes to the spawning scheduler.
    pub async fn run(&self, task_id: Uuid, payload: QueryPayload) {
        let started = self.store.update(
            task_id,
            TaskUpdate::state(TaskState::Running)
                .with_log("Preparing query from input fields."),
        );
        if let Err(e) = started {
            warn!(%task_id, error = %e, "Could not start pipeline run");
            return;
        }

        match self.execute(task_id, &payload).await {
            Ok(findings) => {
                let count = findings.len();
                let completed = self.store.update(
                    task_id,
                    TaskUpdate::state(TaskState::Completed).with_findings(findings),
                );
                match completed {
                    Ok(_) => info!(%task_id, findings = count, "Investigation completed"),
                    Err(e) => warn!(%task_id, error = %e, "Could not record completion"),
                }
            }
            Err(e) => {
                warn!(%task_id, error = %e, "Investigation failed");
                let failed = self.store.update(
                    task_id,
                    TaskUpdate::state(TaskState::Failed).with_error(e.to_string()),
                );
                if let Err(e) = failed {
                    warn!(%task_id, error = %e, "Could not record failure");
                }
            }
        }
    }

    async fn execute(&self, task_id: Uuid, payload: &QueryPayload) -> Result<Vec<Finding>> {
        let query = build_query(payload);
        self.log(task_id, format!("Query constructed: {query:?}"))?;

        self.log(task_id, "Contacting search tool.")?;
        let results = self.tools.search(&query, MAX_SEARCH_RESULTS).await?;
        self.log(
            task_id,
            format!("Search returned {} candidate results.", results.len()),
        )?;

        let total = results.len();
        let mut all_findings: Vec<Finding> = Vec::new();

        for (idx, hit) in results.iter().enumerate() {
            let pos = idx + 1;
            self.log(task_id, format!("[{pos}/{total}] Scraping {}", hit.url))?;
            let page = self.tools.scrape(&hit.url, SCRAPE_MAX_CHARS).await?;

            self.log(
                task_id,
                format!("[{pos}/{total}] Extracting relevant info from scraped text."),
            )?;
            let findings = self.tools.extract(&query, &page.text, &hit.url).await?;
            all_findings.extend(findings);
        }

        let unique = deduplicate_findings(all_findings);
        self.log(
            task_id,
            format!("Deduplicated to {} unique findings.", unique.len()),
        )?;

        Ok(unique)
    }

    fn log(&self, task_id: Uuid, message: impl Into<String>) -> Result<(), StoreError> {
        self.store.update(task_id, TaskUpdate::log(message))?;
        Ok(())
    }
}

/// Concatenate non-empty payload fields with their designated prefixes.
/// Falls back to a generic OSINT query when nothing is set.
pub fn build_query(payload: &QueryPayload) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(phone) = set_field(&payload.phone_number) {
        parts.push(format!("phone:{phone}"));
    }
    if let Some(identifier) = set_field(&payload.identifier) {
        parts.push(format!("id:{identifier}"));
    }
    if let Some(cve) = set_field(&payload.cve) {
        parts.push(format!("CVE:{cve}"));
    }
    if let Some(keyword) = set_field(&payload.keyword) {
        parts.push(keyword.to_string());
    }

    if parts.is_empty() {
        FALLBACK_QUERY.to_string()
    } else {
        parts.join(" ")
    }
}

fn set_field(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cve_only_payload() {
        let payload = QueryPayload {
            cve: Some("CVE-2023-1".to_string()),
            ..Default::default()
        };
        assert_eq!(build_query(&payload), "CVE:CVE-2023-1");
    }

    #[test]
    fn all_empty_payload_falls_back() {
        assert_eq!(build_query(&QueryPayload::default()), FALLBACK_QUERY);
    }

    #[test]
    fn blank_strings_count_as_unset() {
        let payload = QueryPayload {
            phone_number: Some("   ".to_string()),
            keyword: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(build_query(&payload), FALLBACK_QUERY);
    }

    #[test]
    fn phone_and_keyword_join_in_field_order() {
        let payload = QueryPayload {
            phone_number: Some("555".to_string()),
            keyword: Some("malware".to_string()),
            ..Default::default()
        };
        assert_eq!(build_query(&payload), "phone:555 malware");
    }

    #[test]
    fn all_fields_join_in_field_order() {
        let payload = QueryPayload {
            phone_number: Some("555".to_string()),
            identifier: Some("acme-7".to_string()),
            cve: Some("CVE-2024-9".to_string()),
            keyword: Some("breach".to_string()),
        };
        assert_eq!(
            build_query(&payload),
            "phone:555 id:acme-7 CVE:CVE-2024-9 breach"
        );
    }
}
