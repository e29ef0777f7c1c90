//! View-model task and the quadrant/energy enums.
//!
//! A [`ViewTask`] is derived, ephemeral, and never persisted as such: the
//! tag-encoded notes on the server are the single source of truth after any
//! successful round-trip, and the derived fields are always recomputed from
//! them (see [`crate::projection`]).

use serde::{Deserialize, Serialize};

use super::task::{ExternalTask, TaskStatus};

/// One of the four fixed prioritization buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    /// Urgent and important
    DoFirst,
    /// Important, not urgent
    Schedule,
    /// Urgent, not important
    Delegate,
    /// Neither urgent nor important
    Delete,
}

impl Quadrant {
    /// Tag value as embedded in notes, e.g. `do-first`.
    #[must_use]
    pub fn as_tag_value(&self) -> &'static str {
        match self {
            Self::DoFirst => "do-first",
            Self::Schedule => "schedule",
            Self::Delegate => "delegate",
            Self::Delete => "delete",
        }
    }

    /// All quadrants in display order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::DoFirst,
        Quadrant::Schedule,
        Quadrant::Delegate,
        Quadrant::Delete,
    ];
}

/// Every projected task has a quadrant; absence in notes defaults here.
impl Default for Quadrant {
    fn default() -> Self {
        Self::DoFirst
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag_value())
    }
}

impl std::str::FromStr for Quadrant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "do-first" => Ok(Self::DoFirst),
            "schedule" => Ok(Self::Schedule),
            "delegate" => Ok(Self::Delegate),
            "delete" => Ok(Self::Delete),
            _ => Err(format!("Invalid quadrant: {s}")),
        }
    }
}

/// Cognitive-load classification for energy filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Energy {
    /// A quick win
    Quick,
    /// Cognitively demanding work
    Deep,
}

impl Energy {
    /// Tag value as embedded in notes.
    #[must_use]
    pub fn as_tag_value(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Deep => "deep",
        }
    }
}

impl std::fmt::Display for Energy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag_value())
    }
}

impl std::str::FromStr for Energy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quick" => Ok(Self::Quick),
            "deep" => Ok(Self::Deep),
            _ => Err(format!("Invalid energy level: {s}")),
        }
    }
}

/// The application's view of a task: the mirrored external record plus the
/// metadata decoded from its notes and the subtask count computed over the
/// in-memory snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewTask {
    /// The raw external record, notes verbatim (the edit base for future
    /// re-encoding — tags not currently understood survive in here).
    pub task: ExternalTask,
    pub quadrant: Quadrant,
    pub energy: Option<Energy>,
    /// Notes with all metadata tags stripped, for display.
    pub display_notes: String,
    /// Number of tasks in the same snapshot whose parent is this task.
    pub subtask_count: usize,
}

impl ViewTask {
    /// Convenience accessor for the underlying id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.task.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.task.title
    }

    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.task.status
    }
}
