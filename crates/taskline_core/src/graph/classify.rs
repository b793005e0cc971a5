//! Connection gesture classification.
//!
//! # Responsibility
//! - Interpret a user-drawn edge between two projected nodes as an
//!   ownership mutation, or as nothing at all.
//!
//! # Invariants
//! - Classification is direction-agnostic: swapping source and target
//!   yields the same result.
//! - Only a task/artifact pairing implies a mutation; every other pairing
//!   is a discarded no-op.

use crate::graph::node::{Node, NodePayload};
use crate::model::artifact::{ArtifactId, ArtifactKind};
use crate::model::task::TaskId;

/// Ownership change implied by a connection gesture: set the artifact's
/// owner to the task and clear its list-level ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipMutation {
    pub artifact: ArtifactId,
    pub kind: ArtifactKind,
    pub task: TaskId,
}

/// Classifies a connection between two nodes of the last projected graph.
///
/// Returns `None` when neither pairing order puts an artifact against a
/// task; the caller treats that as a no-op.
pub fn classify_connection(a: &Node, b: &Node) -> Option<OwnershipMutation> {
    ownership_between(a, b).or_else(|| ownership_between(b, a))
}

fn ownership_between(artifact_side: &Node, task_side: &Node) -> Option<OwnershipMutation> {
    let task = match &task_side.payload {
        NodePayload::Task(task) => task,
        NodePayload::Start | NodePayload::Note(_) | NodePayload::Attachment(_)
        | NodePayload::UrlMark(_) => return None,
    };
    let artifact = match &artifact_side.payload {
        NodePayload::Note(artifact)
        | NodePayload::Attachment(artifact)
        | NodePayload::UrlMark(artifact) => artifact,
        NodePayload::Start | NodePayload::Task(_) => return None,
    };
    Some(OwnershipMutation {
        artifact: artifact.uuid,
        kind: artifact.kind(),
        task: task.uuid,
    })
}

#[cfg(test)]
mod tests {
    use super::classify_connection;
    use crate::graph::node::{Node, NodeKey, NodePayload, Position};
    use crate::model::artifact::{Artifact, ArtifactKind, ArtifactPayload, Owner};
    use crate::model::task::Task;
    use uuid::Uuid;

    fn task_node(task: &Task) -> Node {
        Node {
            key: NodeKey::Task { uuid: task.uuid },
            position: Position { x: 0, y: 0 },
            payload: NodePayload::Task(task.clone()),
        }
    }

    fn artifact_node(artifact: &Artifact) -> Node {
        Node {
            key: NodeKey::Artifact {
                kind: artifact.kind(),
                owner: None,
                uuid: artifact.uuid,
            },
            position: Position { x: 0, y: 0 },
            payload: NodePayload::for_artifact(artifact.clone()),
        }
    }

    fn start_node() -> Node {
        Node {
            key: NodeKey::Start,
            position: Position { x: 0, y: 0 },
            payload: NodePayload::Start,
        }
    }

    #[test]
    fn task_and_artifact_classify_in_both_directions() {
        let list_uuid = Uuid::new_v4();
        let task = Task::new(list_uuid, "Review");
        let artifact = Artifact::new(
            ArtifactPayload::Attachment {
                file_name: "notes.pdf".to_string(),
                file_path: "/tmp/notes.pdf".to_string(),
            },
            Owner::List(list_uuid),
        );

        let forward = classify_connection(&artifact_node(&artifact), &task_node(&task))
            .expect("artifact->task should classify");
        let reverse = classify_connection(&task_node(&task), &artifact_node(&artifact))
            .expect("task->artifact should classify");

        assert_eq!(forward, reverse);
        assert_eq!(forward.task, task.uuid);
        assert_eq!(forward.artifact, artifact.uuid);
        assert_eq!(forward.kind, ArtifactKind::Attachment);
    }

    #[test]
    fn pairings_without_a_task_do_not_classify() {
        let list_uuid = Uuid::new_v4();
        let note = Artifact::new(
            ArtifactPayload::Note {
                content: "a".to_string(),
            },
            Owner::List(list_uuid),
        );
        let url = Artifact::new(
            ArtifactPayload::UrlMark {
                url: "https://example.com".to_string(),
                name: "example".to_string(),
            },
            Owner::List(list_uuid),
        );

        assert!(classify_connection(&artifact_node(&note), &artifact_node(&url)).is_none());
        assert!(classify_connection(&start_node(), &artifact_node(&note)).is_none());
    }

    #[test]
    fn task_to_task_does_not_classify() {
        let list_uuid = Uuid::new_v4();
        let first = Task::new(list_uuid, "One");
        let second = Task::new(list_uuid, "Two");
        assert!(classify_connection(&task_node(&first), &task_node(&second)).is_none());
    }
}
