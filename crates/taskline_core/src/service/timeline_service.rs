//! Timeline command surface: attach/detach/delete/drop plus recompute.
//!
//! # Responsibility
//! - Resolve canvas gestures against the last projected snapshot.
//! - Apply ownership mutations through the Record Store, then rebuild the
//!   snapshot from store-confirmed state.
//!
//! # Invariants
//! - No optimistic mutation: the snapshot only changes after the store
//!   accepted the write and a full rebuild ran.
//! - Gestures against node keys missing from the snapshot are no-ops with
//!   a diagnostic, never errors; the snapshot may be stale relative to a
//!   just-finished external mutation.
//! - Store failures leave the snapshot untouched.

use crate::graph::build::{project_timeline, TimelineGraph};
use crate::graph::classify::classify_connection;
use crate::graph::node::{NodeKey, NodePayload};
use crate::model::artifact::{Artifact, ArtifactId, ArtifactKind, ArtifactPayload, Owner};
use crate::model::task::{ListId, TaskId};
use crate::recompute::{ChangeCategory, ChangeCounters, ChangeStamp};
use crate::repo::record_store::{RecordStore, StoreError};
use crate::service::intake::{payload_for_drop, DroppedFile};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for timeline commands.
#[derive(Debug)]
pub enum TimelineError {
    /// The Record Store rejected a read or a mutation.
    Store(StoreError),
    /// Create target does not exist in the projected list.
    OwnerNotFound(Owner),
}

impl Display for TimelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::OwnerNotFound(Owner::Task(task_uuid)) => {
                write!(f, "drop target task not found: {task_uuid}")
            }
            Self::OwnerNotFound(Owner::List(list_uuid)) => {
                write!(f, "drop target list not found: {list_uuid}")
            }
        }
    }
}

impl Error for TimelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::OwnerNotFound(_) => None,
        }
    }
}

impl From<StoreError> for TimelineError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of a connect gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The artifact's owner was rewritten to the task.
    Attached { artifact: ArtifactId, task: TaskId },
    /// Neither endpoint pairing implies ownership; nothing persisted.
    AnnotationOnly,
    /// An endpoint key is not in the current snapshot; nothing persisted.
    StaleEndpoint,
}

/// Result of a detach request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachOutcome {
    Detached { artifact: ArtifactId },
    /// The artifact already floats at list level.
    AlreadyListOwned,
    /// Task and start nodes are never detachable.
    NotDetachable,
    /// The node key is not in the current snapshot.
    StaleNode,
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    TaskDeleted { task: TaskId },
    ArtifactDeleted { artifact: ArtifactId },
    /// The start node is synthetic and cannot be deleted.
    NotDeletable,
    /// The node key is not in the current snapshot.
    StaleNode,
}

enum DeletePlan {
    Task {
        task: TaskId,
        owned_kinds: Vec<ArtifactKind>,
    },
    Artifact {
        artifact: ArtifactId,
        kind: ArtifactKind,
    },
    Start,
}

/// Timeline projection and command service for one list.
pub struct TimelineService<R: RecordStore> {
    store: R,
    list_uuid: ListId,
    counters: ChangeCounters,
    rendered: Option<ChangeStamp>,
    graph: TimelineGraph,
}

impl<R: RecordStore> TimelineService<R> {
    /// Creates a service over `store`, scoped to `list_uuid`. The first
    /// `refresh` builds the initial snapshot.
    pub fn new(store: R, list_uuid: ListId) -> Self {
        Self {
            store,
            list_uuid,
            counters: ChangeCounters::new(),
            rendered: None,
            graph: TimelineGraph::default(),
        }
    }

    pub fn list_uuid(&self) -> ListId {
        self.list_uuid
    }

    /// Last built snapshot; empty until the first rebuild.
    pub fn snapshot(&self) -> &TimelineGraph {
        &self.graph
    }

    /// Returns whether any tracked category changed since the last build.
    pub fn needs_rebuild(&self) -> bool {
        match self.rendered {
            None => true,
            Some(stamp) => self.counters.changed_since(stamp),
        }
    }

    /// Rebuilds only when stale; safe to call redundantly.
    pub fn refresh(&mut self) -> Result<&TimelineGraph, TimelineError> {
        if self.needs_rebuild() {
            self.rebuild()?;
        }
        Ok(&self.graph)
    }

    /// Unconditionally re-reads the record set and replaces the snapshot.
    pub fn rebuild(&mut self) -> Result<&TimelineGraph, TimelineError> {
        let started_at = Instant::now();
        // Stamp before the reads: a bump landing mid-read re-dirties the
        // snapshot instead of being lost.
        let stamp = self.counters.stamp();

        let tasks = self.store.list_tasks(self.list_uuid)?;
        let mut floating = Vec::new();
        for kind in ArtifactKind::ALL {
            floating.extend(self.store.list_artifacts(self.list_uuid, kind)?);
        }

        self.graph = project_timeline(self.list_uuid, &tasks, &floating);
        self.rendered = Some(stamp);
        info!(
            "event=timeline_rebuild module=service status=ok duration_ms={} nodes={} edges={} skipped={}",
            started_at.elapsed().as_millis(),
            self.graph.nodes.len(),
            self.graph.edges.len(),
            self.graph.diagnostics.len()
        );
        Ok(&self.graph)
    }

    /// Records an externally-completed CRUD mutation so the next
    /// `refresh` rebuilds.
    pub fn notify_changed(&mut self, category: ChangeCategory) {
        self.counters.bump(category);
    }

    /// Interprets a user-drawn connection between two snapshot nodes.
    pub fn connect(
        &mut self,
        source: NodeKey,
        target: NodeKey,
    ) -> Result<ConnectOutcome, TimelineError> {
        let mutation = {
            let (Some(source_node), Some(target_node)) =
                (self.graph.node(source), self.graph.node(target))
            else {
                warn!(
                    "event=connect_ignored module=service status=skip error_code=stale_node source={source} target={target}"
                );
                return Ok(ConnectOutcome::StaleEndpoint);
            };
            match classify_connection(source_node, target_node) {
                Some(mutation) => mutation,
                // A connection that implies no ownership is discarded; it
                // is never persisted and vanishes on the next rebuild.
                None => return Ok(ConnectOutcome::AnnotationOnly),
            }
        };

        self.store
            .set_artifact_owner(mutation.artifact, Owner::Task(mutation.task))?;
        self.counters.bump_kind(mutation.kind);
        self.rebuild()?;
        info!(
            "event=artifact_attach module=service status=ok artifact={} task={} kind={}",
            mutation.artifact,
            mutation.task,
            mutation.kind.as_str()
        );
        Ok(ConnectOutcome::Attached {
            artifact: mutation.artifact,
            task: mutation.task,
        })
    }

    /// Resets a task-owned artifact back to list ownership.
    pub fn request_detach(&mut self, node: NodeKey) -> Result<DetachOutcome, TimelineError> {
        let (artifact, kind) = {
            let Some(found) = self.graph.node(node) else {
                warn!(
                    "event=detach_ignored module=service status=skip error_code=stale_node node={node}"
                );
                return Ok(DetachOutcome::StaleNode);
            };
            let Some(artifact) = found.payload.artifact() else {
                return Ok(DetachOutcome::NotDetachable);
            };
            if artifact.owner.is_list() {
                return Ok(DetachOutcome::AlreadyListOwned);
            }
            (artifact.uuid, artifact.kind())
        };

        self.store
            .set_artifact_owner(artifact, Owner::List(self.list_uuid))?;
        self.counters.bump_kind(kind);
        self.rebuild()?;
        info!(
            "event=artifact_detach module=service status=ok artifact={artifact} kind={}",
            kind.as_str()
        );
        Ok(DetachOutcome::Detached { artifact })
    }

    /// Deletes the record behind a node. Task deletion cascades owned
    /// artifacts inside the store.
    pub fn request_delete(&mut self, node: NodeKey) -> Result<DeleteOutcome, TimelineError> {
        let plan = {
            let Some(found) = self.graph.node(node) else {
                warn!(
                    "event=delete_ignored module=service status=skip error_code=stale_node node={node}"
                );
                return Ok(DeleteOutcome::StaleNode);
            };
            match &found.payload {
                NodePayload::Start => DeletePlan::Start,
                NodePayload::Task(task) => {
                    let mut owned_kinds = Vec::new();
                    if !task.notes.is_empty() {
                        owned_kinds.push(ArtifactKind::Note);
                    }
                    if !task.attachments.is_empty() {
                        owned_kinds.push(ArtifactKind::Attachment);
                    }
                    if !task.url_marks.is_empty() {
                        owned_kinds.push(ArtifactKind::UrlMark);
                    }
                    DeletePlan::Task {
                        task: task.uuid,
                        owned_kinds,
                    }
                }
                NodePayload::Note(artifact)
                | NodePayload::Attachment(artifact)
                | NodePayload::UrlMark(artifact) => DeletePlan::Artifact {
                    artifact: artifact.uuid,
                    kind: artifact.kind(),
                },
            }
        };

        match plan {
            DeletePlan::Start => Ok(DeleteOutcome::NotDeletable),
            DeletePlan::Task { task, owned_kinds } => {
                self.store.delete_task(task)?;
                self.counters.bump(ChangeCategory::Tasks);
                for kind in owned_kinds {
                    self.counters.bump_kind(kind);
                }
                self.rebuild()?;
                info!("event=task_delete module=service status=ok task={task}");
                Ok(DeleteOutcome::TaskDeleted { task })
            }
            DeletePlan::Artifact { artifact, kind } => {
                self.store.delete_artifact(artifact)?;
                self.counters.bump_kind(kind);
                self.rebuild()?;
                info!(
                    "event=artifact_delete module=service status=ok artifact={artifact} kind={}",
                    kind.as_str()
                );
                Ok(DeleteOutcome::ArtifactDeleted { artifact })
            }
        }
    }

    /// Creates one artifact per dropped item under the target owner, then
    /// rebuilds once.
    pub fn drop_files(
        &mut self,
        files: &[DroppedFile],
        owner: Owner,
    ) -> Result<Vec<Artifact>, TimelineError> {
        self.ensure_owner_exists(owner)?;

        let mut created = Vec::new();
        for file in files {
            let payload = payload_for_drop(file);
            let kind = payload.kind();
            let artifact = self.store.create_artifact(&payload, owner)?;
            self.counters.bump_kind(kind);
            created.push(artifact);
        }
        if !created.is_empty() {
            self.rebuild()?;
            info!(
                "event=files_dropped module=service status=ok count={}",
                created.len()
            );
        }
        Ok(created)
    }

    /// Creates one artifact from an explicit "add" command.
    pub fn add_artifact(
        &mut self,
        payload: ArtifactPayload,
        owner: Owner,
    ) -> Result<Artifact, TimelineError> {
        self.ensure_owner_exists(owner)?;
        let kind = payload.kind();
        let artifact = self.store.create_artifact(&payload, owner)?;
        self.counters.bump_kind(kind);
        self.rebuild()?;
        Ok(artifact)
    }

    /// Create targets resolve against the current snapshot: the projected
    /// list itself, or a task node present in it.
    fn ensure_owner_exists(&self, owner: Owner) -> Result<(), TimelineError> {
        let exists = match owner {
            Owner::List(list_uuid) => list_uuid == self.list_uuid,
            Owner::Task(task_uuid) => self.graph.contains(NodeKey::Task { uuid: task_uuid }),
        };
        if !exists {
            return Err(TimelineError::OwnerNotFound(owner));
        }
        Ok(())
    }
}
