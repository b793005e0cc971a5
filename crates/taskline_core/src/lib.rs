//! Timeline projection core for TaskLine.
//! This crate is the single source of truth for the task-graph projection
//! and the artifact ownership invariants behind it.

pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod recompute;
pub mod repo;
pub mod service;

pub use graph::build::{project_timeline, BuildDiagnostic, TimelineGraph};
pub use graph::classify::{classify_connection, OwnershipMutation};
pub use graph::node::{
    Edge, EdgeKind, HandleSide, LineStyle, Node, NodeKey, NodePayload, Position,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::artifact::{Artifact, ArtifactId, ArtifactKind, ArtifactPayload, Owner};
pub use model::task::{ListId, Stage, Task, TaskId};
pub use recompute::{ChangeCategory, ChangeCounters, ChangeStamp};
pub use repo::record_store::{RecordStore, StoreError, StoreResult};
pub use repo::sqlite_store::SqliteRecordStore;
pub use service::intake::{payload_for_drop, DroppedFile};
pub use service::timeline_service::{
    ConnectOutcome, DeleteOutcome, DetachOutcome, TimelineError, TimelineService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
