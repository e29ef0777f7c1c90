//! # Note Export
//!
//! Flattens a view task (plus its ordered subtasks) for the third-party
//! note-taking boundary and ships it through an export proxy. Exports are
//! fire-and-forget side effects: failures surface to the caller but never
//! touch the task store's state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::ExportConfig;
use crate::error::{QuadrantError, QuadrantResult};
use crate::models::{Energy, Quadrant, TaskStatus, ViewTask};
use crate::session::CredentialSource;

/// Safe sub-chunk size for a single text block at the export boundary.
pub const EXPORT_CHUNK_LIMIT: usize = 2000;

/// One subtask in the flattened export payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSubtask {
    pub title: String,
    pub status: TaskStatus,
}

/// A task flattened for export: display notes (no metadata tags), decoded
/// quadrant/energy, and the ordered subtasks of the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    pub title: String,
    pub notes: String,
    pub quadrant: Quadrant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<Energy>,
    pub status: TaskStatus,
    pub subtasks: Vec<ExportSubtask>,
}

impl ExportTask {
    /// Flatten a view task against the snapshot it was projected from.
    #[must_use]
    pub fn from_view(view: &ViewTask, all: &[ViewTask]) -> Self {
        let subtasks = all
            .iter()
            .filter(|other| other.task.parent.as_deref() == Some(view.task.id.as_str()))
            .map(|other| ExportSubtask {
                title: other.task.title.clone(),
                status: other.task.status,
            })
            .collect();

        Self {
            title: view.task.title.clone(),
            notes: view.display_notes.clone(),
            quadrant: view.quadrant,
            energy: view.energy,
            status: view.task.status,
            subtasks,
        }
    }

    /// Non-empty note paragraphs, each bounded at the export boundary's
    /// per-block character limit.
    #[must_use]
    pub fn note_chunks(&self) -> Vec<String> {
        self.notes
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.chars().take(EXPORT_CHUNK_LIMIT).collect())
            .collect()
    }
}

/// Request/response contract with the note-export boundary.
#[async_trait]
pub trait NoteExporter: Send + Sync {
    /// Export one flattened task to `destination_id`, returning the URL of
    /// the created resource.
    async fn export(&self, task: &ExportTask, destination_id: &str) -> QuadrantResult<String>;
}

#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    #[serde(flatten)]
    task: &'a ExportTask,
    destination_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    url: String,
}

/// HTTP implementation of the export boundary
pub struct RestNoteExporter {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
}

impl std::fmt::Debug for RestNoteExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestNoteExporter")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl RestNoteExporter {
    pub fn new(
        config: &ExportConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> QuadrantResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| QuadrantError::config_error(format!("Invalid export base URL: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("quadrant-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                QuadrantError::config_error(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }
}

#[async_trait]
impl NoteExporter for RestNoteExporter {
    async fn export(&self, task: &ExportTask, destination_id: &str) -> QuadrantResult<String> {
        let token = self
            .credentials
            .bearer_token()
            .ok_or(QuadrantError::Unauthorized)?;
        let url = self
            .base_url
            .join("export")
            .map_err(|e| QuadrantError::config_error(format!("Failed to construct URL: {e}")))?;

        debug!(url = %url, title = %task.title, "exporting task");

        let request = ExportRequest {
            task,
            destination_id,
        };
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            error!("export boundary rejected credential");
            return Err(QuadrantError::Unauthorized);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, message = %message, "export failed");
            return Err(QuadrantError::api_error(status.as_u16(), message));
        }

        let body: ExportResponse = response.json().await?;
        info!(url = %body.url, "task exported");
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExternalTask;
    use crate::projection::project_all;

    fn raw(id: &str, title: &str, parent: Option<&str>) -> ExternalTask {
        ExternalTask {
            id: id.to_string(),
            title: title.to_string(),
            notes: None,
            status: TaskStatus::NeedsAction,
            due: None,
            parent: parent.map(String::from),
            updated: None,
        }
    }

    #[test]
    fn test_flattening_collects_ordered_subtasks() {
        let mut parent = raw("a", "Plan launch", None);
        parent.notes = Some("checklist below\n\n[#q:schedule] [#energy:deep]".to_string());
        let all = project_all(&[
            parent,
            raw("b", "Draft announcement", Some("a")),
            raw("c", "Book venue", Some("a")),
            raw("d", "Unrelated", None),
        ]);

        let export = ExportTask::from_view(&all[0], &all);
        assert_eq!(export.title, "Plan launch");
        assert_eq!(export.notes, "checklist below");
        assert_eq!(export.quadrant, Quadrant::Schedule);
        assert_eq!(export.energy, Some(Energy::Deep));
        let titles: Vec<_> = export.subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Draft announcement", "Book venue"]);
    }

    #[test]
    fn test_note_chunks_bounded() {
        let long = "x".repeat(EXPORT_CHUNK_LIMIT + 500);
        let task = ExportTask {
            title: "t".to_string(),
            notes: format!("short paragraph\n\n{long}"),
            quadrant: Quadrant::DoFirst,
            energy: None,
            status: TaskStatus::NeedsAction,
            subtasks: Vec::new(),
        };

        let chunks = task.note_chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "short paragraph");
        assert_eq!(chunks[1].chars().count(), EXPORT_CHUNK_LIMIT);
    }

    #[test]
    fn test_request_payload_shape() {
        let task = ExportTask {
            title: "t".to_string(),
            notes: String::new(),
            quadrant: Quadrant::Delegate,
            energy: Some(Energy::Quick),
            status: TaskStatus::Completed,
            subtasks: vec![ExportSubtask {
                title: "s".to_string(),
                status: TaskStatus::NeedsAction,
            }],
        };
        let json = serde_json::to_value(ExportRequest {
            task: &task,
            destination_id: "db-1",
        })
        .unwrap();

        assert_eq!(json["destination_id"], "db-1");
        assert_eq!(json["quadrant"], "delegate");
        assert_eq!(json["energy"], "quick");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["subtasks"][0]["title"], "s");
    }
}
