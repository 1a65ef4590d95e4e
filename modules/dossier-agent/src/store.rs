//! In-memory registry of task records.
//!
//! One explicitly constructed store instance lives for the process lifetime
//! and is cloned into the API state, the scheduler, and every running
//! pipeline. All mutation goes through `update` with a typed `TaskUpdate`,
//! one mutex-guarded read-modify-write per call, so a progress append never
//! races a concurrent append and a poll never observes `Completed` without
//! its findings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use uuid::Uuid;

use dossier_common::{Finding, ProgressEntry, TaskRecord, TaskState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Task already exists: {0}")]
    DuplicateTask(Uuid),

    #[error("Unknown task: {0}")]
    UnknownTask(Uuid),

    #[error("Task {0} is in a terminal state and cannot be updated")]
    TerminalTask(Uuid),

    #[error("Illegal state transition: {from} -> {to}")]
    IllegalTransition { from: TaskState, to: TaskState },

    #[error("Invalid update: {0}")]
    InvalidUpdate(&'static str),
}

/// The exact set of mutations a task record admits. Anything not
/// representable here cannot be written.
#[derive(Debug, Default)]
pub struct TaskUpdate {
    state: Option<TaskState>,
    append_log: Option<String>,
    findings: Option<Vec<Finding>>,
    error_message: Option<String>,
}

impl TaskUpdate {
    pub fn state(state: TaskState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn log(message: impl Into<String>) -> Self {
        Self {
            append_log: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_log(mut self, message: impl Into<String>) -> Self {
        self.append_log = Some(message.into());
        self
    }

    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = Some(findings);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

#[derive(Clone, Default)]
pub struct TaskStore {
    tasks: Arc<Mutex<HashMap<Uuid, TaskRecord>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh `Pending` record. Fails if the id is already taken.
    pub fn create(&self, task_id: Uuid) -> Result<TaskRecord, StoreError> {
        let mut tasks = self.lock();
        if tasks.contains_key(&task_id) {
            return Err(StoreError::DuplicateTask(task_id));
        }
        let record = TaskRecord::new(task_id);
        tasks.insert(task_id, record.clone());
        Ok(record)
    }

    /// Snapshot of the current record. Callers get a clone; record identity
    /// never escapes the store.
    pub fn get(&self, task_id: Uuid) -> Result<TaskRecord, StoreError> {
        self.lock()
            .get(&task_id)
            .cloned()
            .ok_or(StoreError::UnknownTask(task_id))
    }

    /// Apply a partial update atomically and return the updated snapshot.
    ///
    /// Enforced invariants:
    /// - terminal records reject every update
    /// - state moves only along Pending -> Running -> {Completed, Failed}
    /// - `findings` may only be written with the Completed transition
    /// - `error_message` may only be written with the Failed transition
    pub fn update(&self, task_id: Uuid, update: TaskUpdate) -> Result<TaskRecord, StoreError> {
        if update.findings.is_some() && update.state != Some(TaskState::Completed) {
            return Err(StoreError::InvalidUpdate(
                "findings may only be set with the completed transition",
            ));
        }
        if update.error_message.is_some() && update.state != Some(TaskState::Failed) {
            return Err(StoreError::InvalidUpdate(
                "error_message may only be set with the failed transition",
            ));
        }

        let mut tasks = self.lock();
        let record = tasks
            .get_mut(&task_id)
            .ok_or(StoreError::UnknownTask(task_id))?;

        if record.state.is_terminal() {
            return Err(StoreError::TerminalTask(task_id));
        }

        if let Some(to) = update.state {
            let legal = matches!(
                (record.state, to),
                (TaskState::Pending, TaskState::Running)
                    | (TaskState::Running, TaskState::Completed)
                    | (TaskState::Running, TaskState::Failed)
            );
            if !legal {
                return Err(StoreError::IllegalTransition {
                    from: record.state,
                    to,
                });
            }
        }

        if let Some(message) = update.append_log {
            record.progress_log.push(ProgressEntry::now(message));
        }
        if let Some(findings) = update.findings {
            record.findings = findings;
        }
        if let Some(message) = update.error_message {
            record.error_message = Some(message);
        }
        if let Some(state) = update.state {
            record.state = state;
        }

        Ok(record.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, TaskRecord>> {
        // A panic while holding the lock leaves records structurally intact
        // (every write above is a single field assignment or push), so the
        // poisoned guard is safe to reuse.
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
