//! # Data Model
//!
//! Mirrored external task records, the quadrant/energy enums, and the
//! derived view-model task used by the UI layer.

pub mod list;
pub mod task;
pub mod view;

pub use list::TaskList;
pub use task::{ExternalTask, TaskDraft, TaskPatch, TaskStatus};
pub use view::{Energy, Quadrant, ViewTask};
