//! # External Task Boundary
//!
//! Transport-agnostic interface to the external task persistence service.
//! The reconciling store is written against [`TaskBoundary`] only, so the
//! REST client and the offline demo store are interchangeable (and tests
//! substitute a programmable double).

use async_trait::async_trait;

use crate::error::QuadrantResult;
use crate::models::{ExternalTask, TaskDraft, TaskList, TaskPatch};

pub mod local;
pub mod rest;

pub use local::LocalTaskBoundary;
pub use rest::RestTaskBoundary;

/// Fetch-scope flags for listing tasks.
#[derive(Debug, Clone, Copy)]
pub struct ListTasksOptions {
    pub include_completed: bool,
    pub include_hidden: bool,
}

/// The store fetches everything; filtering is a UI concern.
impl Default for ListTasksOptions {
    fn default() -> Self {
        Self {
            include_completed: true,
            include_hidden: true,
        }
    }
}

/// Create/read/update/delete contract with the external task service.
///
/// Every call is authenticated with a bearer credential; implementations
/// must distinguish an unauthorized response
/// ([`QuadrantError::Unauthorized`](crate::error::QuadrantError::Unauthorized))
/// from other failures so the store can route it to the session controller.
#[async_trait]
pub trait TaskBoundary: Send + Sync {
    /// List the available task lists.
    async fn list_task_lists(&self) -> QuadrantResult<Vec<TaskList>>;

    /// List all tasks in a list.
    async fn list_tasks(
        &self,
        list_id: &str,
        options: ListTasksOptions,
    ) -> QuadrantResult<Vec<ExternalTask>>;

    /// Create a task. Subtask creation is modeled via list+parent
    /// addressing, so `parent` travels as a query parameter, not a body
    /// field.
    async fn create_task(
        &self,
        list_id: &str,
        draft: &TaskDraft,
        parent: Option<&str>,
    ) -> QuadrantResult<ExternalTask>;

    /// Partially update a task, returning the authoritative server record.
    async fn patch_task(
        &self,
        list_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> QuadrantResult<ExternalTask>;

    /// Delete a task.
    async fn delete_task(&self, list_id: &str, task_id: &str) -> QuadrantResult<()>;
}
