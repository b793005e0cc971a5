//! Artifact domain model: notes, file attachments and URL bookmarks.
//!
//! # Responsibility
//! - Define the artifact record and its payload union.
//! - Represent ownership as a two-state enum so "both owners set" and
//!   "no owner set" cannot be constructed.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another artifact.
//! - Attach/detach only ever moves an artifact between `Owner::Task` and
//!   `Owner::List`; deletion leaves the model entirely.

use crate::model::task::{ListId, TaskId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an artifact of any kind.
pub type ArtifactId = Uuid;

/// Bare artifact category, used for bucketing and change tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Note,
    Attachment,
    UrlMark,
}

impl ArtifactKind {
    /// All kinds in the lateral-row presentation order: notes, then
    /// attachments, then URL marks.
    pub const ALL: [ArtifactKind; 3] = [Self::Note, Self::Attachment, Self::UrlMark];

    /// Stable storage/logging tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Attachment => "attachment",
            Self::UrlMark => "url_mark",
        }
    }
}

/// Display payload per artifact kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactPayload {
    Note { content: String },
    Attachment { file_name: String, file_path: String },
    UrlMark { url: String, name: String },
}

impl ArtifactPayload {
    /// Returns the bare kind discriminant of this payload.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Note { .. } => ArtifactKind::Note,
            Self::Attachment { .. } => ArtifactKind::Attachment,
            Self::UrlMark { .. } => ArtifactKind::UrlMark,
        }
    }

    /// Short human-readable label used by canvas consumers.
    pub fn display_label(&self) -> &str {
        match self {
            Self::Note { content } => content,
            Self::Attachment { file_name, .. } => file_name,
            Self::UrlMark { name, .. } => name,
        }
    }
}

/// Current owner of an artifact: a task, or the enclosing list when the
/// artifact floats unattached at list level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "uuid", rename_all = "snake_case")]
pub enum Owner {
    Task(TaskId),
    List(ListId),
}

impl Owner {
    /// Returns the owning task id, if task-owned.
    pub fn task(self) -> Option<TaskId> {
        match self {
            Self::Task(task_uuid) => Some(task_uuid),
            Self::List(_) => None,
        }
    }

    /// Returns whether the artifact floats at list level.
    pub fn is_list(self) -> bool {
        matches!(self, Self::List(_))
    }
}

/// Canonical artifact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Stable global ID used for node identity and ownership mutations.
    pub uuid: ArtifactId,
    pub payload: ArtifactPayload,
    pub owner: Owner,
}

impl Artifact {
    /// Creates an artifact with a generated stable ID.
    pub fn new(payload: ArtifactPayload, owner: Owner) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            payload,
            owner,
        }
    }

    /// Returns the bare kind discriminant of the payload.
    pub fn kind(&self) -> ArtifactKind {
        self.payload.kind()
    }

    /// Moves ownership to `task`. Re-attaching an already task-owned
    /// artifact to a different task is a plain overwrite.
    pub fn attach_to(&mut self, task_uuid: TaskId) {
        self.owner = Owner::Task(task_uuid);
    }

    /// Resets ownership to the enclosing list.
    pub fn detach_to(&mut self, list_uuid: ListId) {
        self.owner = Owner::List(list_uuid);
    }
}
