//! Projected node and edge types.
//!
//! # Responsibility
//! - Define the transient visual-graph elements handed to the canvas.
//! - Keep node identity structured so lookups never parse id strings.
//!
//! # Invariants
//! - `NodeKey` equality is pure value equality over (type, owner, record).
//! - A task-scoped artifact key differs from the list-scoped key of the
//!   same artifact, so re-ownership changes node identity.

use crate::model::artifact::{Artifact, ArtifactId, ArtifactKind};
use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Task-node handle an ownership edge leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleSide {
    /// Left handle: note edges.
    Notes,
    /// Right handle: attachment and URL-mark edges.
    Resources,
}

impl HandleSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Resources => "resources",
        }
    }
}

/// Structured node identity derived from the underlying record.
///
/// Task-scoped artifact keys carry the owning task id; list-scoped keys
/// carry `owner: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeKey {
    /// Synthetic chain head used when no task is completed.
    Start,
    Task {
        uuid: TaskId,
    },
    Artifact {
        kind: ArtifactKind,
        owner: Option<TaskId>,
        uuid: ArtifactId,
    },
}

impl Display for NodeKey {
    /// Stable string rendering for canvas ids and log lines.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Task { uuid } => write!(f, "task:{uuid}"),
            Self::Artifact {
                kind,
                owner: Some(task_uuid),
                uuid,
            } => write!(f, "{}:{task_uuid}:{uuid}", kind.as_str()),
            Self::Artifact {
                kind,
                owner: None,
                uuid,
            } => write!(f, "{}:list:{uuid}", kind.as_str()),
        }
    }
}

/// Canvas coordinates. Integer-valued: layout is additive arithmetic over
/// fixed constants, never fractional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Record payload carried by a node, one variant per projectable type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodePayload {
    Start,
    Task(Task),
    Note(Artifact),
    Attachment(Artifact),
    UrlMark(Artifact),
}

impl NodePayload {
    /// Wraps an artifact in the payload variant matching its kind.
    pub fn for_artifact(artifact: Artifact) -> Self {
        match artifact.kind() {
            ArtifactKind::Note => Self::Note(artifact),
            ArtifactKind::Attachment => Self::Attachment(artifact),
            ArtifactKind::UrlMark => Self::UrlMark(artifact),
        }
    }

    /// Returns the carried artifact, if this is an artifact node.
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Note(artifact) | Self::Attachment(artifact) | Self::UrlMark(artifact) => {
                Some(artifact)
            }
            Self::Start | Self::Task(_) => None,
        }
    }

    /// Returns the carried task, if this is a task node.
    pub fn task(&self) -> Option<&Task> {
        match self {
            Self::Task(task) => Some(task),
            _ => None,
        }
    }
}

/// One projected node. Created fresh on every rebuild, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub key: NodeKey,
    pub position: Position,
    pub payload: NodePayload,
}

/// Rendering hint for an edge kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
    Smoothstep,
}

/// Edge role in the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    /// done -> done link inside the chain; rendered solid.
    Chain,
    /// chain tail -> active task; rendered dashed and animated.
    Branch,
    /// task -> owned artifact; rendered smoothstep from the given handle.
    Ownership { handle: HandleSide },
}

impl EdgeKind {
    pub fn line_style(self) -> LineStyle {
        match self {
            Self::Chain => LineStyle::Solid,
            Self::Branch => LineStyle::Dashed,
            Self::Ownership { .. } => LineStyle::Smoothstep,
        }
    }

    /// Only branch edges animate.
    pub fn is_animated(self) -> bool {
        matches!(self, Self::Branch)
    }
}

/// One projected edge between two node keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeKey,
    pub target: NodeKey,
    pub kind: EdgeKind,
}

impl Edge {
    /// Stable string id for canvas consumers.
    pub fn id(&self) -> String {
        format!("{}->{}", self.source, self.target)
    }
}
