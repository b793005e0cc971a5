//! Timeline graph builder.
//!
//! # Responsibility
//! - Project tasks and list-level artifacts into the full node/edge set.
//! - Skip records that violate the ownership model, surfacing a typed
//!   diagnostic instead of aborting the rebuild.
//!
//! # Invariants
//! - Output depends only on input values; two builds over the same records
//!   are identical, positions included.
//! - Exactly one virtual start node exists, and only when no task is done.
//! - Each task node's ownership edges correspond 1:1 with the artifacts
//!   that survived validation; no artifact yields two nodes.

use crate::graph::layout::{
    branch_slot, chain_slot, list_row_slot, note_slot, resource_slot,
};
use crate::graph::node::{Edge, EdgeKind, HandleSide, Node, NodeKey, NodePayload, Position};
use crate::model::artifact::{Artifact, ArtifactId, ArtifactKind, Owner};
use crate::model::task::{ListId, Task, TaskId};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// Reason a record was left out of the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BuildDiagnostic {
    /// A lateral-row candidate is not owned by the projected list.
    NotListOwned { artifact: ArtifactId },
    /// A bucket artifact is not owned by the bucket's task.
    OwnerMismatch { artifact: ArtifactId, task: TaskId },
    /// A bucket artifact's payload kind does not match its bucket.
    KindMismatch {
        artifact: ArtifactId,
        task: TaskId,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    /// The artifact already produced a node earlier in this build.
    DuplicateArtifact { artifact: ArtifactId },
}

impl Display for BuildDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotListOwned { artifact } => {
                write!(f, "artifact {artifact} is not owned by the projected list")
            }
            Self::OwnerMismatch { artifact, task } => {
                write!(f, "artifact {artifact} is not owned by bucket task {task}")
            }
            Self::KindMismatch {
                artifact,
                task,
                expected,
                found,
            } => write!(
                f,
                "artifact {artifact} in {} bucket of task {task} has kind {}",
                expected.as_str(),
                found.as_str()
            ),
            Self::DuplicateArtifact { artifact } => {
                write!(f, "artifact {artifact} already projected in this build")
            }
        }
    }
}

/// Plain-data projection snapshot handed to the canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Records skipped during this build, in encounter order.
    pub diagnostics: Vec<BuildDiagnostic>,
}

impl TimelineGraph {
    /// Looks up a node by key.
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.iter().find(|node| node.key == key)
    }

    /// Returns whether a node with `key` exists in this snapshot.
    pub fn contains(&self, key: NodeKey) -> bool {
        self.node(key).is_some()
    }

    /// Edges leaving `key`, in projection order.
    pub fn edges_from(&self, key: NodeKey) -> Vec<&Edge> {
        self.edges.iter().filter(|edge| edge.source == key).collect()
    }

    /// Edges arriving at `key`, in projection order.
    pub fn edges_to(&self, key: NodeKey) -> Vec<&Edge> {
        self.edges.iter().filter(|edge| edge.target == key).collect()
    }
}

struct BuildState {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    diagnostics: Vec<BuildDiagnostic>,
    projected: HashSet<ArtifactId>,
}

impl BuildState {
    fn skip(&mut self, diagnostic: BuildDiagnostic) {
        warn!("event=projection_skip module=graph status=skip detail=\"{diagnostic}\"");
        self.diagnostics.push(diagnostic);
    }

    /// Claims the artifact id for this build; false when already taken.
    fn claim(&mut self, artifact: ArtifactId) -> bool {
        if self.projected.insert(artifact) {
            return true;
        }
        self.skip(BuildDiagnostic::DuplicateArtifact { artifact });
        false
    }
}

/// Projects the record set of one list into a timeline graph.
///
/// Pure and total: malformed entries are skipped with a diagnostic and the
/// remaining records still project. `list_artifacts` holds the list-owned
/// (floating) artifacts; task-owned artifacts arrive pre-joined inside
/// each [`Task`].
pub fn project_timeline(
    list_uuid: ListId,
    tasks: &[Task],
    list_artifacts: &[Artifact],
) -> TimelineGraph {
    let mut state = BuildState {
        nodes: Vec::new(),
        edges: Vec::new(),
        diagnostics: Vec::new(),
        projected: HashSet::new(),
    };

    let mut done: Vec<&Task> = tasks.iter().filter(|task| task.is_done()).collect();
    done.sort_by(|a, b| {
        b.sort_order
            .cmp(&a.sort_order)
            .then_with(|| a.uuid.cmp(&b.uuid))
    });
    let active: Vec<&Task> = tasks.iter().filter(|task| !task.is_done()).collect();

    place_list_row(list_uuid, list_artifacts, &mut state);

    // Done chain: one column, stepping down, solid links.
    let mut previous_key: Option<NodeKey> = None;
    for (row, task) in done.iter().enumerate() {
        let key = NodeKey::Task { uuid: task.uuid };
        let position = chain_slot(row);
        state.nodes.push(Node {
            key,
            position,
            payload: NodePayload::Task((*task).clone()),
        });
        if let Some(previous) = previous_key {
            state.edges.push(Edge {
                source: previous,
                target: key,
                kind: EdgeKind::Chain,
            });
        }
        previous_key = Some(key);
        place_owned(task, position, &mut state);
    }

    // Branch anchor: the chain tail, or a synthesized start node occupying
    // the chain head slot when nothing is done yet.
    let anchor = match previous_key {
        Some(tail) => tail,
        None => {
            state.nodes.push(Node {
                key: NodeKey::Start,
                position: chain_slot(0),
                payload: NodePayload::Start,
            });
            NodeKey::Start
        }
    };

    let first_branch_row = done.len().max(1);
    for (offset, task) in active.iter().enumerate() {
        let key = NodeKey::Task { uuid: task.uuid };
        let position = branch_slot(first_branch_row + offset);
        state.nodes.push(Node {
            key,
            position,
            payload: NodePayload::Task((*task).clone()),
        });
        state.edges.push(Edge {
            source: anchor,
            target: key,
            kind: EdgeKind::Branch,
        });
        place_owned(task, position, &mut state);
    }

    TimelineGraph {
        nodes: state.nodes,
        edges: state.edges,
        diagnostics: state.diagnostics,
    }
}

/// Lays the floating artifacts along the lateral row: notes, then
/// attachments, then URL marks, evenly spaced left to right.
fn place_list_row(list_uuid: ListId, list_artifacts: &[Artifact], state: &mut BuildState) {
    let mut slot = 0usize;
    for kind in ArtifactKind::ALL {
        for artifact in list_artifacts.iter().filter(|a| a.kind() == kind) {
            match artifact.owner {
                Owner::List(owner_uuid) if owner_uuid == list_uuid => {}
                _ => {
                    state.skip(BuildDiagnostic::NotListOwned {
                        artifact: artifact.uuid,
                    });
                    continue;
                }
            }
            if !state.claim(artifact.uuid) {
                continue;
            }
            state.nodes.push(Node {
                key: NodeKey::Artifact {
                    kind,
                    owner: None,
                    uuid: artifact.uuid,
                },
                position: list_row_slot(slot),
                payload: NodePayload::for_artifact(artifact.clone()),
            });
            slot += 1;
        }
    }
}

/// Fans a task's owned artifacts out around its node: notes stacked to the
/// left, attachments then URL marks stacked to the right.
fn place_owned(task: &Task, task_position: Position, state: &mut BuildState) {
    let mut left_stack = 0usize;
    for artifact in &task.notes {
        if !bucket_entry_is_valid(task, artifact, ArtifactKind::Note, state) {
            continue;
        }
        place_owned_artifact(
            task.uuid,
            artifact,
            note_slot(task_position, left_stack),
            HandleSide::Notes,
            state,
        );
        left_stack += 1;
    }

    let mut right_stack = 0usize;
    for (bucket, kind) in [
        (&task.attachments, ArtifactKind::Attachment),
        (&task.url_marks, ArtifactKind::UrlMark),
    ] {
        for artifact in bucket {
            if !bucket_entry_is_valid(task, artifact, kind, state) {
                continue;
            }
            place_owned_artifact(
                task.uuid,
                artifact,
                resource_slot(task_position, right_stack),
                HandleSide::Resources,
                state,
            );
            right_stack += 1;
        }
    }
}

fn bucket_entry_is_valid(
    task: &Task,
    artifact: &Artifact,
    expected: ArtifactKind,
    state: &mut BuildState,
) -> bool {
    if artifact.kind() != expected {
        state.skip(BuildDiagnostic::KindMismatch {
            artifact: artifact.uuid,
            task: task.uuid,
            expected,
            found: artifact.kind(),
        });
        return false;
    }
    if artifact.owner != Owner::Task(task.uuid) {
        state.skip(BuildDiagnostic::OwnerMismatch {
            artifact: artifact.uuid,
            task: task.uuid,
        });
        return false;
    }
    state.claim(artifact.uuid)
}

fn place_owned_artifact(
    task_uuid: TaskId,
    artifact: &Artifact,
    position: Position,
    handle: HandleSide,
    state: &mut BuildState,
) {
    let key = NodeKey::Artifact {
        kind: artifact.kind(),
        owner: Some(task_uuid),
        uuid: artifact.uuid,
    };
    state.nodes.push(Node {
        key,
        position,
        payload: NodePayload::for_artifact(artifact.clone()),
    });
    state.edges.push(Edge {
        source: NodeKey::Task { uuid: task_uuid },
        target: key,
        kind: EdgeKind::Ownership { handle },
    });
}
