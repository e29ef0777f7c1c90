//! # REST Task Boundary
//!
//! HTTP client for the external task-list service. The bearer credential is
//! pulled from a [`CredentialSource`] on every call so a silently refreshed
//! token takes effect without rebuilding the client.
//!
//! There is no automatic retry: failed calls surface to the store, which
//! leaves retrying to the user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::BoundaryConfig;
use crate::error::{QuadrantError, QuadrantResult};
use crate::models::{ExternalTask, TaskDraft, TaskList, TaskPatch};
use crate::session::CredentialSource;

use super::{ListTasksOptions, TaskBoundary};

/// Envelope for collection endpoints (`{ "items": [...] }`).
#[derive(Debug, Deserialize)]
struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// HTTP client for the task-list service
pub struct RestTaskBoundary {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
}

impl std::fmt::Debug for RestTaskBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTaskBoundary")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl RestTaskBoundary {
    /// Create a client from configuration and a credential source.
    pub fn new(
        config: &BoundaryConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> QuadrantResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| QuadrantError::config_error(format!("Invalid base URL: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("quadrant-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                QuadrantError::config_error(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            "created REST task boundary"
        );

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str) -> QuadrantResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| QuadrantError::config_error(format!("Failed to construct URL: {e}")))
    }

    /// Current bearer token, or `Unauthorized` when the session holds none.
    fn bearer_token(&self) -> QuadrantResult<String> {
        self.credentials
            .bearer_token()
            .ok_or(QuadrantError::Unauthorized)
    }

    /// Map a non-success response into the error taxonomy. 401 must be
    /// distinguished so the store can route it to the session controller.
    async fn check(response: reqwest::Response) -> QuadrantResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            error!(status = %status, "task service rejected credential");
            return Err(QuadrantError::Unauthorized);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, message = %message, "task service request failed");
        Err(QuadrantError::api_error(status.as_u16(), message))
    }
}

#[async_trait]
impl TaskBoundary for RestTaskBoundary {
    async fn list_task_lists(&self) -> QuadrantResult<Vec<TaskList>> {
        let token = self.bearer_token()?;
        let url = self.endpoint("users/@me/lists")?;
        debug!(url = %url, "fetching task lists");

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let envelope: ItemsEnvelope<TaskList> = Self::check(response).await?.json().await?;

        info!(count = envelope.items.len(), "fetched task lists");
        Ok(envelope.items)
    }

    async fn list_tasks(
        &self,
        list_id: &str,
        options: ListTasksOptions,
    ) -> QuadrantResult<Vec<ExternalTask>> {
        let token = self.bearer_token()?;
        let url = self.endpoint(&format!("lists/{list_id}/tasks"))?;
        debug!(url = %url, list_id = %list_id, "fetching tasks");

        let response = self
            .client
            .get(url)
            .query(&[
                ("showCompleted", options.include_completed),
                ("showHidden", options.include_hidden),
            ])
            .bearer_auth(token)
            .send()
            .await?;
        let envelope: ItemsEnvelope<ExternalTask> = Self::check(response).await?.json().await?;

        info!(
            list_id = %list_id,
            count = envelope.items.len(),
            "fetched tasks"
        );
        Ok(envelope.items)
    }

    async fn create_task(
        &self,
        list_id: &str,
        draft: &TaskDraft,
        parent: Option<&str>,
    ) -> QuadrantResult<ExternalTask> {
        let token = self.bearer_token()?;
        let url = self.endpoint(&format!("lists/{list_id}/tasks"))?;
        debug!(url = %url, title = %draft.title, parent = ?parent, "creating task");

        let mut request = self.client.post(url).bearer_auth(token).json(draft);
        if let Some(parent_id) = parent {
            request = request.query(&[("parent", parent_id)]);
        }

        let response = request.send().await?;
        let created: ExternalTask = Self::check(response).await?.json().await?;

        info!(task_id = %created.id, "created task");
        Ok(created)
    }

    async fn patch_task(
        &self,
        list_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> QuadrantResult<ExternalTask> {
        let token = self.bearer_token()?;
        let url = self.endpoint(&format!("lists/{list_id}/tasks/{task_id}"))?;
        debug!(url = %url, task_id = %task_id, "patching task");

        let response = self
            .client
            .patch(url)
            .bearer_auth(token)
            .json(patch)
            .send()
            .await?;
        let updated: ExternalTask = Self::check(response).await?.json().await?;

        info!(task_id = %updated.id, "patched task");
        Ok(updated)
    }

    async fn delete_task(&self, list_id: &str, task_id: &str) -> QuadrantResult<()> {
        let token = self.bearer_token()?;
        let url = self.endpoint(&format!("lists/{list_id}/tasks/{task_id}"))?;
        debug!(url = %url, task_id = %task_id, "deleting task");

        let response = self.client.delete(url).bearer_auth(token).send().await?;
        Self::check(response).await?;

        info!(task_id = %task_id, "deleted task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoCredential;

    impl CredentialSource for NoCredential {
        fn bearer_token(&self) -> Option<String> {
            None
        }
    }

    fn boundary() -> RestTaskBoundary {
        RestTaskBoundary::new(&BoundaryConfig::default(), Arc::new(NoCredential)).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let b = boundary();
        assert_eq!(b.base_url(), "https://tasks.googleapis.com/tasks/v1");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = BoundaryConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(RestTaskBoundary::new(&config, Arc::new(NoCredential)).is_err());
    }

    #[test]
    fn test_endpoint_construction() {
        let b = boundary();
        let url = b.endpoint("lists/abc/tasks/xyz").unwrap();
        assert_eq!(
            url.as_str(),
            "https://tasks.googleapis.com/tasks/v1/lists/abc/tasks/xyz"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_is_unauthorized_before_network() {
        let b = boundary();
        let err = b.list_task_lists().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_items_envelope_tolerates_missing_items() {
        let envelope: ItemsEnvelope<TaskList> = serde_json::from_str("{}").unwrap();
        assert!(envelope.items.is_empty());
    }
}
