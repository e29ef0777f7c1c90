//! # Quadrant Core
//!
//! Synchronization core for an Eisenhower-matrix task board backed by an
//! external task-list service. The external schema has no concept of
//! quadrant or energy level, so that metadata is embedded in each task's
//! free-text notes as `[#key:value]` tags and reconciled on every
//! round-trip.
//!
//! ## Module Organization
//!
//! - [`codec`] - Tag encode/decode over free-text notes
//! - [`projection`] - Pure derivation of view-model tasks from raw records
//! - [`store`] - The reconciling task store: optimistic mutation, rollback,
//!   reconciliation with the boundary
//! - [`session`] - Authentication lifecycle gating boundary calls
//! - [`boundary`] - The external task boundary (REST client and offline
//!   demo store)
//! - [`export`] - Fire-and-forget note export
//! - [`models`] - Mirrored external records and derived view types
//! - [`config`] - Configuration with environment overrides
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing initialization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quadrant_core::{
//!     AccessCredential, LocalTaskBoundary, Quadrant, ReconcilingTaskStore,
//!     SessionController, SessionHandle,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let boundary = Arc::new(LocalTaskBoundary::open(std::path::Path::new("/tmp/demo"), None)?);
//! let session = SessionHandle::new(SessionController::new());
//! session.log_in(AccessCredential::demo())?;
//!
//! let mut store = ReconcilingTaskStore::new(boundary, session);
//! store.load_lists().await?;
//! store
//!     .add_task("Buy milk", "", Quadrant::Schedule, None, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod boundary;
pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod projection;
pub mod session;
pub mod store;

pub use boundary::{ListTasksOptions, LocalTaskBoundary, RestTaskBoundary, TaskBoundary};
pub use config::{BoundaryConfig, DemoConfig, ExportConfig, QuadrantConfig};
pub use error::{QuadrantError, QuadrantResult};
pub use export::{ExportSubtask, ExportTask, NoteExporter, RestNoteExporter};
pub use models::{
    Energy, ExternalTask, Quadrant, TaskDraft, TaskList, TaskPatch, TaskStatus, ViewTask,
};
pub use projection::{project, project_all};
pub use session::{
    AccessCredential, CredentialSource, SessionController, SessionEvent, SessionHandle,
    SessionState, TokenRefresher,
};
pub use store::{ReconcilingTaskStore, TaskUpdates};
