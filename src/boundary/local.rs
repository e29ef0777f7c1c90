//! # Local Task Boundary
//!
//! Demo/offline stand-in for the network boundary: a JSON array of external
//! task records under a fixed storage name, read on open and rewritten
//! after every mutation. Serves a single fixed demo list and never requires
//! a credential. An optional artificial delay approximates network latency.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{QuadrantError, QuadrantResult};
use crate::models::{ExternalTask, TaskDraft, TaskList, TaskPatch};

use super::{ListTasksOptions, TaskBoundary};

/// Id of the single demo list.
pub const DEMO_LIST_ID: &str = "demo-list";
/// Fixed storage name for the persisted task array.
pub const DEMO_STORE_FILE: &str = "demo-tasks.json";

/// File-backed boundary with synchronous-equivalent semantics
pub struct LocalTaskBoundary {
    path: PathBuf,
    latency: Option<Duration>,
    tasks: Mutex<Vec<ExternalTask>>,
}

impl std::fmt::Debug for LocalTaskBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTaskBoundary")
            .field("path", &self.path)
            .field("latency", &self.latency)
            .finish()
    }
}

impl LocalTaskBoundary {
    /// Open (or initialize) the demo store under `data_dir`.
    pub fn open(data_dir: &Path, latency_ms: Option<u64>) -> QuadrantResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(DEMO_STORE_FILE);

        let tasks: Vec<ExternalTask> = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Vec::new()
        };

        info!(path = %path.display(), count = tasks.len(), "opened local task store");

        Ok(Self {
            path,
            latency: latency_ms.map(Duration::from_millis),
            tasks: Mutex::new(tasks),
        })
    }

    fn persist(&self, tasks: &[ExternalTask]) -> QuadrantResult<()> {
        let raw = serde_json::to_string_pretty(tasks)?;
        std::fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), count = tasks.len(), "rewrote local task store");
        Ok(())
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.latency {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_list(list_id: &str) -> QuadrantResult<()> {
        if list_id == DEMO_LIST_ID {
            Ok(())
        } else {
            Err(QuadrantError::api_error(
                404,
                format!("unknown demo list: {list_id}"),
            ))
        }
    }
}

#[async_trait]
impl TaskBoundary for LocalTaskBoundary {
    async fn list_task_lists(&self) -> QuadrantResult<Vec<TaskList>> {
        self.simulate_latency().await;
        Ok(vec![TaskList::new(DEMO_LIST_ID, "My Tasks (Demo)")])
    }

    async fn list_tasks(
        &self,
        list_id: &str,
        _options: ListTasksOptions,
    ) -> QuadrantResult<Vec<ExternalTask>> {
        self.simulate_latency().await;
        Self::check_list(list_id)?;
        Ok(self.tasks.lock().clone())
    }

    async fn create_task(
        &self,
        list_id: &str,
        draft: &TaskDraft,
        parent: Option<&str>,
    ) -> QuadrantResult<ExternalTask> {
        self.simulate_latency().await;
        Self::check_list(list_id)?;

        let created = ExternalTask {
            id: format!("demo-{}", Uuid::new_v4()),
            title: draft.title.clone(),
            notes: draft.notes.clone(),
            status: Default::default(),
            due: draft.due,
            parent: parent.map(String::from),
            updated: Some(Utc::now()),
        };

        let mut tasks = self.tasks.lock();
        tasks.insert(0, created.clone());
        self.persist(&tasks)?;
        Ok(created)
    }

    async fn patch_task(
        &self,
        list_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> QuadrantResult<ExternalTask> {
        self.simulate_latency().await;
        Self::check_list(list_id)?;

        let mut tasks = self.tasks.lock();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| QuadrantError::api_error(404, format!("no such task: {task_id}")))?;

        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(notes) = &patch.notes {
            task.notes = Some(notes.clone());
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(due) = patch.due {
            task.due = Some(due);
        }
        task.updated = Some(Utc::now());

        let updated = task.clone();
        self.persist(&tasks)?;
        Ok(updated)
    }

    async fn delete_task(&self, list_id: &str, task_id: &str) -> QuadrantResult<()> {
        self.simulate_latency().await;
        Self::check_list(list_id)?;

        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Err(QuadrantError::api_error(
                404,
                format!("no such task: {task_id}"),
            ));
        }
        self.persist(&tasks)?;
        Ok(())
    }
}
