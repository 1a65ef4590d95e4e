//! Within-run finding dedup.

use std::collections::HashSet;

use dossier_common::Finding;

/// Drop findings whose composite key `(source_name, source_link, summary
/// prefix)` was already seen, keeping the first occurrence of each. Stable:
/// survivors stay in their original relative order.
pub fn deduplicate_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert(f.dedup_key()))
        .collect()
}
