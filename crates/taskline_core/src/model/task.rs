//! Task domain model.
//!
//! # Responsibility
//! - Define the workflow-stage task record read from the Record Store.
//! - Carry the pre-joined owned-artifact buckets used by the projection.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another task.
//! - `completed_at` is meaningful only when `stage` is terminal.
//! - Bucket contents are owned by this task in well-formed input; the
//!   projection skips entries that violate this instead of trusting them.

use crate::model::artifact::Artifact;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a list (the top-level board scoping tasks).
pub type ListId = Uuid;

/// Stable identifier for a task.
pub type TaskId = Uuid;

/// Workflow stage of a task. `Done` is the single terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Created but not started.
    Todo,
    /// Work is in progress.
    InProgress,
    /// Completed; eligible for the done chain.
    Done,
}

impl Stage {
    /// Returns whether this stage ends the task workflow.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Task record as returned by `RecordStore::list_tasks`, pre-joined with
/// the artifacts it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID used for node identity and ownership references.
    pub uuid: TaskId,
    /// Enclosing list.
    pub list_uuid: ListId,
    pub title: String,
    pub stage: Stage,
    /// Manual position within the stage column; the done chain is ordered
    /// by this value descending.
    pub sort_order: i64,
    /// Unix epoch milliseconds; set when the task entered `Stage::Done`.
    pub completed_at: Option<i64>,
    /// Owned notes, rendered left of the task node.
    pub notes: Vec<Artifact>,
    /// Owned file attachments, rendered right of the task node.
    pub attachments: Vec<Artifact>,
    /// Owned URL bookmarks, rendered right of the task node below the
    /// attachments.
    pub url_marks: Vec<Artifact>,
}

impl Task {
    /// Creates a task in `Stage::Todo` with empty artifact buckets.
    pub fn new(list_uuid: ListId, title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            list_uuid,
            title: title.into(),
            stage: Stage::Todo,
            sort_order: 0,
            completed_at: None,
            notes: Vec::new(),
            attachments: Vec::new(),
            url_marks: Vec::new(),
        }
    }

    /// Returns whether the task belongs to the done chain.
    pub fn is_done(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Total number of artifacts in the three owned buckets.
    pub fn owned_artifact_count(&self) -> usize {
        self.notes.len() + self.attachments.len() + self.url_marks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Stage, Task};
    use uuid::Uuid;

    #[test]
    fn only_done_is_terminal() {
        assert!(Stage::Done.is_terminal());
        assert!(!Stage::Todo.is_terminal());
        assert!(!Stage::InProgress.is_terminal());
    }

    #[test]
    fn new_task_starts_in_todo_with_empty_buckets() {
        let task = Task::new(Uuid::new_v4(), "Draft outline");
        assert_eq!(task.stage, Stage::Todo);
        assert!(!task.is_done());
        assert_eq!(task.owned_artifact_count(), 0);
        assert!(task.completed_at.is_none());
    }
}
