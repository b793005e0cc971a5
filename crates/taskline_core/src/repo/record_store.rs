//! Record Store interface consumed by the timeline core.
//!
//! # Responsibility
//! - Specify exactly the read/write surface the projection and the
//!   attach/detach paths need, keyed by stable ids.
//!
//! # Invariants
//! - `list_tasks` returns tasks pre-joined with their owned artifacts.
//! - `list_artifacts` returns only list-owned (floating) artifacts.
//! - `delete_task` cascades deletion of owned artifacts inside the store.

use crate::db::DbError;
use crate::model::artifact::{Artifact, ArtifactId, ArtifactKind, ArtifactPayload, Owner};
use crate::model::task::{ListId, Task, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error for persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    ListNotFound(ListId),
    TaskNotFound(TaskId),
    ArtifactNotFound(ArtifactId),
    /// Connection schema is not at the version this build expects.
    SchemaVersion { expected: u32, actual: u32 },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ListNotFound(uuid) => write!(f, "list not found: {uuid}"),
            Self::TaskNotFound(uuid) => write!(f, "task not found: {uuid}"),
            Self::ArtifactNotFound(uuid) => write!(f, "artifact not found: {uuid}"),
            Self::SchemaVersion { expected, actual } => write!(
                f,
                "record store requires schema version {expected}, got {actual}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store interface for the timeline core.
///
/// Calls are synchronous; the single-threaded shell serializes them, and
/// every mutation path rebuilds from store-confirmed state afterwards.
pub trait RecordStore {
    /// Tasks of one list, pre-joined with their owned artifact buckets,
    /// ordered by `sort_order ASC, uuid ASC`.
    fn list_tasks(&self, list_uuid: ListId) -> StoreResult<Vec<Task>>;

    /// List-owned artifacts of one kind, in creation order.
    fn list_artifacts(&self, list_uuid: ListId, kind: ArtifactKind) -> StoreResult<Vec<Artifact>>;

    /// Creates an artifact under `owner` and returns the stored record.
    fn create_artifact(&self, payload: &ArtifactPayload, owner: Owner) -> StoreResult<Artifact>;

    /// Rewrites an artifact's owner reference and returns the stored
    /// record. The previous owner reference is cleared in the same write.
    fn set_artifact_owner(&self, artifact_uuid: ArtifactId, owner: Owner) -> StoreResult<Artifact>;

    /// Deletes one artifact.
    fn delete_artifact(&self, artifact_uuid: ArtifactId) -> StoreResult<()>;

    /// Deletes one task; owned artifacts are cascaded by the store.
    fn delete_task(&self, task_uuid: TaskId) -> StoreResult<()>;
}
