use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use dossier_common::QueryPayload;

use crate::pipeline::PipelineRunner;
use crate::store::{StoreError, TaskStore};
use crate::traits::ToolClient;

/// Entry point for new investigations: registers the task record, then
/// detaches the pipeline run. The spawned future is never awaited and never
/// cancelled; it always drives its record to a terminal state on its own.
#[derive(Clone)]
pub struct TaskScheduler {
    store: TaskStore,
    tools: Arc<dyn ToolClient>,
}

impl TaskScheduler {
    pub fn new(store: TaskStore, tools: Arc<dyn ToolClient>) -> Self {
        Self { store, tools }
    }

    /// Start an investigation and return its id immediately. The record is
    /// registered in `Pending` before this returns, so a caller can poll the
    /// id right away without racing the spawn.
    pub fn start(&self, payload: QueryPayload) -> Result<Uuid, StoreError> {
        let task_id = Uuid::new_v4();
        self.store.create(task_id)?;

        let runner = PipelineRunner::new(self.store.clone(), self.tools.clone());
        tokio::spawn(async move {
            runner.run(task_id, payload).await;
        });

        info!(%task_id, "Investigation scheduled");
        Ok(task_id)
    }
}
