//! External task records as stored by the remote task-list service, plus the
//! create/patch wire shapes.
//!
//! The remote schema has no notion of quadrant or energy; that metadata
//! travels inside the free-text `notes` field (see [`crate::codec`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix distinguishing client-minted ids from server-assigned ones.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Completion status as the external service models it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Task is still open
    NeedsAction,
    /// Task has been completed
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::NeedsAction
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NeedsAction => write!(f, "needsAction"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "needsAction" => Ok(Self::NeedsAction),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

/// A task record mirrored from the external task-list service.
///
/// `notes` is the encoding substrate for quadrant/energy tags; everything
/// else is the service's own schema. `parent` establishes a one-level
/// subtask relationship (no deeper nesting is modeled).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTask {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Full-date granularity; date-only inputs are encoded as midnight UTC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Server-assigned last-modification timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl ExternalTask {
    /// Mint a client-side record with a temporary id, used for optimistic
    /// inserts before the boundary confirms the create.
    pub fn temporary(title: impl Into<String>, notes: Option<String>) -> Self {
        Self {
            id: format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4()),
            title: title.into(),
            notes,
            status: TaskStatus::NeedsAction,
            due: None,
            parent: None,
            updated: None,
        }
    }

    /// Whether this record still carries a client-minted id.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }
}

/// Payload for creating a task at the boundary.
///
/// The parent, when present, is addressed via list+parent query parameters
/// rather than a body field, so it is not part of this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

/// Partial-update payload for the boundary.
///
/// Only external-schema fields exist here, so UI-only derived fields
/// (display notes, quadrant, energy, subtask count) can never leak onto the
/// wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Fully re-encoded notes (display text plus metadata tags).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Whether the patch carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.notes.is_none() && self.status.is_none() && self.due.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(TaskStatus::NeedsAction.to_string(), "needsAction");
        assert_eq!(
            "completed".parse::<TaskStatus>().unwrap(),
            TaskStatus::Completed
        );
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&TaskStatus::NeedsAction).unwrap();
        assert_eq!(json, "\"needsAction\"");
        let parsed: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, TaskStatus::Completed);
    }

    #[test]
    fn test_temporary_id() {
        let task = ExternalTask::temporary("Buy milk", None);
        assert!(task.is_temporary());
        assert!(task.id.starts_with(TEMP_ID_PREFIX));

        let confirmed = ExternalTask {
            id: "srv-123".to_string(),
            ..task
        };
        assert!(!confirmed.is_temporary());
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = TaskPatch {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "New title" }));
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_external_task_round_trip() {
        let json = serde_json::json!({
            "id": "abc",
            "title": "Plan sprint",
            "notes": "details\n\n[#q:schedule]",
            "status": "needsAction",
            "due": "2026-03-01T00:00:00Z",
            "updated": "2026-02-20T10:30:00Z"
        });
        let task: ExternalTask = serde_json::from_value(json).unwrap();
        assert_eq!(task.title, "Plan sprint");
        assert_eq!(task.status, TaskStatus::NeedsAction);
        assert!(task.parent.is_none());
        assert!(task.due.is_some());
    }
}
