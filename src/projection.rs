//! # Task Projection
//!
//! Pure derivation of [`ViewTask`] from raw external records. Malformed or
//! absent tags are treated as absence (defaults apply), never a hard
//! failure, so a projection can never fail.

use crate::codec::{parse_tag, strip_all_tags, ENERGY_KEY, QUADRANT_KEY};
use crate::models::{Energy, ExternalTask, Quadrant, ViewTask};

/// Project a single external record against a snapshot of the full
/// in-memory set (needed for the subtask count).
///
/// Idempotent and side-effect free; identical input yields identical
/// output.
#[must_use]
pub fn project(task: &ExternalTask, all: &[ExternalTask]) -> ViewTask {
    let notes = task.notes.as_deref().unwrap_or("");

    let quadrant = parse_tag(notes, QUADRANT_KEY)
        .and_then(|v| v.parse::<Quadrant>().ok())
        .unwrap_or_default();

    let energy = parse_tag(notes, ENERGY_KEY).and_then(|v| v.parse::<Energy>().ok());

    let subtask_count = all
        .iter()
        .filter(|other| other.parent.as_deref() == Some(task.id.as_str()))
        .count();

    ViewTask {
        task: task.clone(),
        quadrant,
        energy,
        display_notes: strip_all_tags(notes),
        subtask_count,
    }
}

/// Project a whole fetched set at once.
#[must_use]
pub fn project_all(tasks: &[ExternalTask]) -> Vec<ViewTask> {
    tasks.iter().map(|t| project(t, tasks)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn raw(id: &str, notes: Option<&str>, parent: Option<&str>) -> ExternalTask {
        ExternalTask {
            id: id.to_string(),
            title: format!("task {id}"),
            notes: notes.map(String::from),
            status: TaskStatus::NeedsAction,
            due: None,
            parent: parent.map(String::from),
            updated: None,
        }
    }

    #[test]
    fn test_default_quadrant_when_untagged() {
        let task = raw("a", Some("plain notes"), None);
        let view = project(&task, std::slice::from_ref(&task));
        assert_eq!(view.quadrant, Quadrant::DoFirst);
        assert_eq!(view.energy, None);
        assert_eq!(view.display_notes, "plain notes");
    }

    #[test]
    fn test_default_quadrant_when_notes_absent() {
        let task = raw("a", None, None);
        let view = project(&task, std::slice::from_ref(&task));
        assert_eq!(view.quadrant, Quadrant::DoFirst);
        assert_eq!(view.display_notes, "");
    }

    #[test]
    fn test_decodes_quadrant_and_energy() {
        let task = raw("a", Some("prep deck\n\n[#q:delegate] [#energy:quick]"), None);
        let view = project(&task, std::slice::from_ref(&task));
        assert_eq!(view.quadrant, Quadrant::Delegate);
        assert_eq!(view.energy, Some(Energy::Quick));
        assert_eq!(view.display_notes, "prep deck");
        // The raw notes survive verbatim as the edit base.
        assert_eq!(
            view.task.notes.as_deref(),
            Some("prep deck\n\n[#q:delegate] [#energy:quick]")
        );
    }

    #[test]
    fn test_malformed_tag_treated_as_absent() {
        let task = raw("a", Some("[#q:not_a_quadrant]"), None);
        let view = project(&task, std::slice::from_ref(&task));
        assert_eq!(view.quadrant, Quadrant::DoFirst);
    }

    #[test]
    fn test_subtask_count_one_level() {
        let a = raw("a", None, None);
        let b = raw("b", None, Some("a"));
        let c = raw("c", None, Some("a"));
        let all = vec![a.clone(), b.clone(), c.clone()];

        assert_eq!(project(&a, &all).subtask_count, 2);
        assert_eq!(project(&b, &all).subtask_count, 0);
        assert_eq!(project(&c, &all).subtask_count, 0);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let task = raw("a", Some("notes\n\n[#q:schedule]"), None);
        let all = vec![task.clone()];
        assert_eq!(project(&task, &all), project(&task, &all));
    }
}
