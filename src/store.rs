//! # Reconciling Task Store
//!
//! The stateful synchronization engine. It owns the canonical in-memory
//! task collection for the current list and is the single point of contact
//! with the external persistence boundary.
//!
//! Every mutation is applied optimistically before the boundary call is
//! dispatched, so the UI never shows stale state while a request is in
//! flight. Reconciliation rules differ per operation:
//!
//! - **create**: the temporary entry is replaced in place on success and
//!   discarded on any failure;
//! - **update**: the server record overwrites the optimistic merge on
//!   success; failures leave the optimistic state visible and retryable
//!   (no rollback);
//! - **delete**: the removed record is reinstated on any failure, because a
//!   vanished-but-extant task is actively misleading.
//!
//! Unauthorized responses are routed to the session controller instead of
//! the store-level error banner. Overlapping mutations of one task are not
//! sequenced; the last response to arrive wins in memory.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::boundary::{ListTasksOptions, TaskBoundary};
use crate::codec::{clear_tag, set_tag, set_tags, strip_all_tags, ENERGY_KEY, QUADRANT_KEY};
use crate::error::{QuadrantError, QuadrantResult};
use crate::models::{
    Energy, ExternalTask, Quadrant, TaskDraft, TaskList, TaskPatch, TaskStatus, ViewTask,
};
use crate::projection::{project, project_all};
use crate::session::SessionHandle;

/// Partial update for [`ReconcilingTaskStore::update_task`].
///
/// `notes` carries display-level text; the store re-encodes it with the
/// resolved quadrant/energy tags before it reaches the wire. `energy` is
/// doubly optional so an explicit clear (`Some(None)`) is distinguishable
/// from "leave unchanged" (`None`).
#[derive(Debug, Clone, Default)]
pub struct TaskUpdates {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub status: Option<TaskStatus>,
    pub due: Option<DateTime<Utc>>,
    pub quadrant: Option<Quadrant>,
    pub energy: Option<Option<Energy>>,
}

impl TaskUpdates {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_due(mut self, due: DateTime<Utc>) -> Self {
        self.due = Some(due);
        self
    }

    #[must_use]
    pub fn with_quadrant(mut self, quadrant: Quadrant) -> Self {
        self.quadrant = Some(quadrant);
        self
    }

    /// `Some(level)` sets the energy, `None` clears it.
    #[must_use]
    pub fn with_energy(mut self, energy: Option<Energy>) -> Self {
        self.energy = Some(energy);
        self
    }

    fn touches_notes(&self) -> bool {
        self.notes.is_some() || self.quadrant.is_some() || self.energy.is_some()
    }
}

/// The reconciling task store.
///
/// Exclusively owns and mutates the in-memory task collection; other
/// components read snapshots and never mutate it directly.
pub struct ReconcilingTaskStore {
    boundary: Arc<dyn TaskBoundary>,
    session: SessionHandle,
    tasks: Vec<ViewTask>,
    lists: Vec<TaskList>,
    current_list: Option<String>,
    last_error: Option<String>,
    loading: bool,
}

impl std::fmt::Debug for ReconcilingTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcilingTaskStore")
            .field("current_list", &self.current_list)
            .field("tasks", &self.tasks.len())
            .field("lists", &self.lists.len())
            .field("last_error", &self.last_error)
            .field("loading", &self.loading)
            .finish()
    }
}

impl ReconcilingTaskStore {
    pub fn new(boundary: Arc<dyn TaskBoundary>, session: SessionHandle) -> Self {
        Self {
            boundary,
            session,
            tasks: Vec::new(),
            lists: Vec::new(),
            current_list: None,
            last_error: None,
            loading: false,
        }
    }

    // ===================================================================
    // READ ACCESSORS
    // ===================================================================

    pub fn tasks(&self) -> &[ViewTask] {
        &self.tasks
    }

    /// Tasks projected into one quadrant, in store order (newest first).
    pub fn tasks_in(&self, quadrant: Quadrant) -> impl Iterator<Item = &ViewTask> {
        self.tasks.iter().filter(move |t| t.quadrant == quadrant)
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn current_list(&self) -> Option<&str> {
        self.current_list.as_deref()
    }

    /// Last store-level error message, shown until the next successful
    /// operation or an explicit [`clear_error`](Self::clear_error).
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // ===================================================================
    // LOADING
    // ===================================================================

    /// Fetch the available lists and ensure a valid selection: the current
    /// list is kept if still present, otherwise the first list returned is
    /// selected. Triggers a task reload for the selection.
    pub async fn load_lists(&mut self) -> QuadrantResult<()> {
        if !self.session.is_authorized() {
            debug!("session not authorized; skipping list fetch");
            return Ok(());
        }

        debug!("loading task lists");
        match self.boundary.list_task_lists().await {
            Ok(lists) => {
                self.lists = lists;
                let Some(selected) = self.select_list() else {
                    self.current_list = None;
                    self.tasks.clear();
                    warn!("no task lists available");
                    return Ok(());
                };

                if self.current_list.as_deref() != Some(selected.as_str()) {
                    info!(list_id = %selected, "selected task list");
                    self.current_list = Some(selected);
                    self.tasks.clear();
                }
                self.load_tasks_for_current_list().await
            }
            Err(e) if e.is_unauthorized() => {
                self.route_unauthorized("load_lists").await;
                Err(e)
            }
            Err(e) => {
                self.fail("load_lists", &e);
                Err(e)
            }
        }
    }

    fn select_list(&self) -> Option<String> {
        match &self.current_list {
            Some(current) if self.lists.iter().any(|l| &l.id == current) => Some(current.clone()),
            _ => self.lists.first().map(|l| l.id.clone()),
        }
    }

    /// Fetch all tasks (completed and hidden included) for the current list
    /// and replace the in-memory set wholesale.
    pub async fn load_tasks_for_current_list(&mut self) -> QuadrantResult<()> {
        let Some(list_id) = self.current_list.clone() else {
            debug!("no current list; nothing to load");
            return Ok(());
        };
        if !self.session.is_authorized() {
            debug!("session not authorized; skipping task fetch");
            return Ok(());
        }

        self.loading = true;
        let result = self
            .boundary
            .list_tasks(&list_id, ListTasksOptions::default())
            .await;
        self.loading = false;

        match result {
            Ok(raw) => {
                self.apply_fetched_tasks(&list_id, raw);
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                self.route_unauthorized("load_tasks").await;
                Err(e)
            }
            Err(e) => {
                self.fail("load_tasks", &e);
                Err(e)
            }
        }
    }

    /// Apply a fetched snapshot for `list_id`.
    ///
    /// Responses are tagged with the list they were fetched for; a response
    /// arriving after the current list changed is discarded so it cannot
    /// overwrite the new list's task set.
    pub fn apply_fetched_tasks(&mut self, list_id: &str, raw: Vec<ExternalTask>) {
        if self.current_list.as_deref() != Some(list_id) {
            debug!(
                list_id = %list_id,
                current = ?self.current_list,
                "discarding stale fetch response"
            );
            return;
        }
        self.tasks = project_all(&raw);
        self.last_error = None;
        info!(list_id = %list_id, count = self.tasks.len(), "replaced in-memory task set");
    }

    /// Switch the current list. No-op when `list_id` is already current;
    /// otherwise the in-memory set is discarded and refetched.
    pub async fn switch_list(&mut self, list_id: &str) -> QuadrantResult<()> {
        if self.current_list.as_deref() == Some(list_id) {
            debug!(list_id = %list_id, "list already current");
            return Ok(());
        }
        info!(list_id = %list_id, "switching current list");
        self.current_list = Some(list_id.to_string());
        self.tasks.clear();
        self.load_tasks_for_current_list().await
    }

    // ===================================================================
    // MUTATIONS
    // ===================================================================

    /// Create a task optimistically at the head of the set (newest first),
    /// then reconcile with the boundary's confirmed record.
    ///
    /// Energy is omitted on creation; only the quadrant tag is encoded.
    pub async fn add_task(
        &mut self,
        title: &str,
        notes: &str,
        quadrant: Quadrant,
        due: Option<DateTime<Utc>>,
        parent: Option<&str>,
    ) -> QuadrantResult<ViewTask> {
        let Some(list_id) = self.current_list.clone() else {
            let err = QuadrantError::validation("no task list selected");
            self.fail("add_task", &err);
            return Err(err);
        };
        let title = title.trim();
        if title.is_empty() {
            let err = QuadrantError::validation("task title must not be empty");
            self.fail("add_task", &err);
            return Err(err);
        }

        let tagged_notes = set_tag(notes, QUADRANT_KEY, quadrant.as_tag_value());

        let mut raw = ExternalTask::temporary(title, Some(tagged_notes.clone()));
        raw.due = due;
        raw.parent = parent.map(String::from);
        let temp_id = raw.id.clone();

        let optimistic = ViewTask {
            task: raw,
            quadrant,
            energy: None,
            display_notes: strip_all_tags(&tagged_notes),
            subtask_count: 0,
        };
        self.tasks.insert(0, optimistic.clone());
        self.refresh_subtask_counts();

        if !self.session.is_authorized() {
            debug!(temp_id = %temp_id, "session not authorized; keeping unsynced optimistic task");
            return Ok(optimistic);
        }

        let draft = TaskDraft {
            title: title.to_string(),
            notes: Some(tagged_notes),
            due,
        };

        match self.boundary.create_task(&list_id, &draft, parent).await {
            Ok(created) => {
                let confirmed = self.reconcile_entry(&temp_id, created);
                self.last_error = None;
                Ok(confirmed)
            }
            Err(e) if e.is_unauthorized() => {
                self.tasks.retain(|t| t.task.id != temp_id);
                self.refresh_subtask_counts();
                self.route_unauthorized("add_task").await;
                Err(e)
            }
            Err(e) => {
                self.tasks.retain(|t| t.task.id != temp_id);
                self.refresh_subtask_counts();
                self.fail("add_task", &e);
                Err(e)
            }
        }
    }

    /// Partially update a task. No-op when the id is unknown.
    ///
    /// Overlapping updates of the same task are not sequenced; the last
    /// response to complete wins in memory.
    pub async fn update_task(&mut self, task_id: &str, updates: TaskUpdates) -> QuadrantResult<()> {
        let Some(list_id) = self.current_list.clone() else {
            debug!("no current list; update ignored");
            return Ok(());
        };
        let Some(position) = self.tasks.iter().position(|t| t.task.id == task_id) else {
            debug!(task_id = %task_id, "update for unknown task ignored");
            return Ok(());
        };

        // Recompute the wire notes whenever the display notes or the
        // embedded metadata change. The base text is the supplied notes or
        // the existing stripped display notes, re-encoded with the resolved
        // quadrant and energy.
        let recomputed_notes = if updates.touches_notes() {
            let existing = &self.tasks[position];
            let base = updates
                .notes
                .clone()
                .unwrap_or_else(|| existing.display_notes.clone());
            let quadrant = updates.quadrant.unwrap_or(existing.quadrant);
            let energy = match updates.energy {
                Some(explicit) => explicit,
                None => existing.energy,
            };
            let encoded = match energy {
                Some(level) => set_tags(
                    &base,
                    &[
                        (QUADRANT_KEY, quadrant.as_tag_value()),
                        (ENERGY_KEY, level.as_tag_value()),
                    ],
                ),
                None => clear_tag(
                    &set_tag(&base, QUADRANT_KEY, quadrant.as_tag_value()),
                    ENERGY_KEY,
                ),
            };
            Some(encoded)
        } else {
            None
        };

        // Optimistic merge before dispatch.
        {
            let view = &mut self.tasks[position];
            if let Some(title) = &updates.title {
                view.task.title = title.clone();
            }
            if let Some(status) = updates.status {
                view.task.status = status;
            }
            if let Some(due) = updates.due {
                view.task.due = Some(due);
            }
            if let Some(notes) = &recomputed_notes {
                view.task.notes = Some(notes.clone());
                view.display_notes = strip_all_tags(notes);
            }
            if let Some(quadrant) = updates.quadrant {
                view.quadrant = quadrant;
            }
            if let Some(energy) = updates.energy {
                view.energy = energy;
            }
        }

        if !self.session.is_authorized() {
            debug!(task_id = %task_id, "session not authorized; keeping unsynced optimistic edit");
            return Ok(());
        }

        let patch = TaskPatch {
            title: updates.title,
            notes: recomputed_notes,
            status: updates.status,
            due: updates.due,
        };

        match self.boundary.patch_task(&list_id, task_id, &patch).await {
            Ok(confirmed) => {
                // Server is authoritative post-write.
                self.reconcile_entry(task_id, confirmed);
                self.last_error = None;
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                // Optimistic state stays; acceptable staleness until the
                // next successful sync.
                self.route_unauthorized("update_task").await;
                Err(e)
            }
            Err(e) => {
                // No rollback: the edited task stays visible and retryable.
                self.fail("update_task", &e);
                Err(e)
            }
        }
    }

    /// Delete a task optimistically; reinstate it on any failure.
    pub async fn delete_task(&mut self, task_id: &str) -> QuadrantResult<()> {
        let Some(list_id) = self.current_list.clone() else {
            debug!("no current list; delete ignored");
            return Ok(());
        };
        let Some(position) = self.tasks.iter().position(|t| t.task.id == task_id) else {
            debug!(task_id = %task_id, "delete for unknown task ignored");
            return Ok(());
        };

        let removed = self.tasks.remove(position);
        self.refresh_subtask_counts();

        if !self.session.is_authorized() {
            debug!(task_id = %task_id, "session not authorized; keeping unsynced optimistic delete");
            return Ok(());
        }

        match self.boundary.delete_task(&list_id, task_id).await {
            Ok(()) => {
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                // Roll back: reinstate the record at its original position.
                let position = position.min(self.tasks.len());
                self.tasks.insert(position, removed);
                self.refresh_subtask_counts();
                if e.is_unauthorized() {
                    self.route_unauthorized("delete_task").await;
                } else {
                    self.fail("delete_task", &e);
                }
                Err(e)
            }
        }
    }

    // ===================================================================
    // INTERNALS
    // ===================================================================

    /// Replace the entry holding `previous_id` with the authoritative
    /// server record, re-projected against the updated snapshot, preserving
    /// its array position.
    fn reconcile_entry(&mut self, previous_id: &str, confirmed: ExternalTask) -> ViewTask {
        let snapshot: Vec<ExternalTask> = self
            .tasks
            .iter()
            .map(|v| {
                if v.task.id == previous_id {
                    confirmed.clone()
                } else {
                    v.task.clone()
                }
            })
            .collect();
        let view = project(&confirmed, &snapshot);

        if let Some(position) = self.tasks.iter().position(|t| t.task.id == previous_id) {
            self.tasks[position] = view.clone();
        } else {
            // The entry vanished while the call was in flight (e.g. a list
            // switch); the response has nothing to supersede.
            debug!(task_id = %confirmed.id, "no optimistic entry to reconcile");
        }
        self.refresh_subtask_counts();
        view
    }

    fn refresh_subtask_counts(&mut self) {
        let parents: Vec<Option<String>> =
            self.tasks.iter().map(|v| v.task.parent.clone()).collect();
        for view in &mut self.tasks {
            view.subtask_count = parents
                .iter()
                .filter(|p| p.as_deref() == Some(view.task.id.as_str()))
                .count();
        }
    }

    fn fail(&mut self, operation: &str, err: &QuadrantError) {
        error!(operation = operation, error = %err, "store operation failed");
        self.last_error = Some(err.to_string());
    }

    async fn route_unauthorized(&self, operation: &str) {
        warn!(
            operation = operation,
            "unauthorized response; routing to session controller"
        );
        self.session.handle_unauthorized().await;
    }
}
