use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Investigation input ---

/// User input for one investigation. All fields optional; empty strings are
/// treated as unset. Immutable once submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryPayload {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub cve: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

// --- Findings ---

/// Number of summary characters that participate in the duplicate key.
/// Extraction may phrase the same fact slightly differently across calls,
/// so dedup is by prefix rather than exact summary equality.
pub const DEDUP_SUMMARY_PREFIX_CHARS: usize = 80;

/// One extracted fact about the query, sourced from a single web page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub source_name: String,
    pub found_at: DateTime<Utc>,
    pub source_link: String,
    pub summary: String,
}

impl Finding {
    /// Composite duplicate key. Prefix is taken on character boundaries so
    /// multibyte summaries never split a codepoint.
    pub fn dedup_key(&self) -> (String, String, String) {
        let prefix: String = self
            .summary
            .chars()
            .take(DEDUP_SUMMARY_PREFIX_CHARS)
            .collect();
        (self.source_name.clone(), self.source_link.clone(), prefix)
    }
}

// --- Task lifecycle ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One timestamped human-readable progress line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl ProgressEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

/// Lifecycle record of one investigation.
///
/// Invariants (enforced by the task store):
/// - once `state` is terminal it never changes again
/// - `progress_log` is append-only
/// - `findings` is written exactly once, with the transition to `Completed`
/// - `error_message` is present only on `Failed` records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: Uuid,
    pub state: TaskState,
    pub progress_log: Vec<ProgressEntry>,
    pub findings: Vec<Finding>,
    pub error_message: Option<String>,
}

impl TaskRecord {
    pub fn new(task_id: Uuid) -> Self {
        Self {
            task_id,
            state: TaskState::Pending,
            progress_log: Vec::new(),
            findings: Vec::new(),
            error_message: None,
        }
    }
}
