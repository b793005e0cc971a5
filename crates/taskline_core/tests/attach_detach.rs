use rusqlite::Connection;
use taskline_core::db::open_db_in_memory;
use taskline_core::{
    Artifact, ArtifactId, ArtifactKind, ArtifactPayload, ConnectOutcome, DeleteOutcome,
    DetachOutcome, DroppedFile, EdgeKind, ListId, NodeKey, Owner, RecordStore, SqliteRecordStore,
    StoreError, StoreResult, Task, TaskId, TimelineError, TimelineService,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service_for(conn: &Connection, list_uuid: ListId) -> TimelineService<SqliteRecordStore<'_>> {
    let mut service = TimelineService::new(SqliteRecordStore::try_new(conn).unwrap(), list_uuid);
    service.refresh().unwrap();
    service
}

fn floating_note(fixture: &SqliteRecordStore<'_>, list_uuid: ListId, content: &str) -> Artifact {
    fixture
        .create_artifact(
            &ArtifactPayload::Note {
                content: content.to_string(),
            },
            Owner::List(list_uuid),
        )
        .unwrap()
}

fn list_key(artifact: &Artifact) -> NodeKey {
    NodeKey::Artifact {
        kind: artifact.kind(),
        owner: None,
        uuid: artifact.uuid,
    }
}

fn task_scoped_key(artifact: &Artifact, task_uuid: TaskId) -> NodeKey {
    NodeKey::Artifact {
        kind: artifact.kind(),
        owner: Some(task_uuid),
        uuid: artifact.uuid,
    }
}

#[test]
fn connect_attaches_a_floating_artifact_to_a_task() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let task_uuid = fixture.create_task(list_uuid, "Write draft", 0).unwrap();
    let note = floating_note(&fixture, list_uuid, "floating");

    let mut service = service_for(&conn, list_uuid);
    let outcome = service
        .connect(list_key(&note), NodeKey::Task { uuid: task_uuid })
        .unwrap();

    assert_eq!(
        outcome,
        ConnectOutcome::Attached {
            artifact: note.uuid,
            task: task_uuid
        }
    );
    let snapshot = service.snapshot();
    assert!(snapshot.contains(task_scoped_key(&note, task_uuid)));
    assert!(!snapshot.contains(list_key(&note)));

    let stored = fixture.get_artifact(note.uuid).unwrap().unwrap();
    assert_eq!(stored.owner, Owner::Task(task_uuid));
}

#[test]
fn attach_then_detach_restores_the_previous_graph() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let task_uuid = fixture.create_task(list_uuid, "Write draft", 0).unwrap();
    let note = floating_note(&fixture, list_uuid, "floating");

    let mut service = service_for(&conn, list_uuid);
    let before = service.snapshot().clone();

    service
        .connect(list_key(&note), NodeKey::Task { uuid: task_uuid })
        .unwrap();
    assert_ne!(service.snapshot(), &before);

    let outcome = service
        .request_detach(task_scoped_key(&note, task_uuid))
        .unwrap();
    assert_eq!(outcome, DetachOutcome::Detached { artifact: note.uuid });
    assert_eq!(service.snapshot(), &before);
}

#[test]
fn reconnecting_moves_ownership_to_the_second_task() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let first_task = fixture.create_task(list_uuid, "First", 0).unwrap();
    let second_task = fixture.create_task(list_uuid, "Second", 1).unwrap();
    let note = floating_note(&fixture, list_uuid, "wandering");

    let mut service = service_for(&conn, list_uuid);
    service
        .connect(list_key(&note), NodeKey::Task { uuid: first_task })
        .unwrap();
    let outcome = service
        .connect(
            task_scoped_key(&note, first_task),
            NodeKey::Task { uuid: second_task },
        )
        .unwrap();

    assert_eq!(
        outcome,
        ConnectOutcome::Attached {
            artifact: note.uuid,
            task: second_task
        }
    );
    let stored = fixture.get_artifact(note.uuid).unwrap().unwrap();
    assert_eq!(stored.owner, Owner::Task(second_task));

    // Exactly one ownership edge points at the artifact, from the second task.
    let snapshot = service.snapshot();
    let incoming = snapshot.edges_to(task_scoped_key(&note, second_task));
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].source, NodeKey::Task { uuid: second_task });
    assert!(!snapshot.contains(task_scoped_key(&note, first_task)));
}

#[test]
fn connect_between_two_artifacts_changes_nothing() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let first = floating_note(&fixture, list_uuid, "one");
    let second = floating_note(&fixture, list_uuid, "two");

    let mut service = service_for(&conn, list_uuid);
    let before = service.snapshot().clone();
    let outcome = service.connect(list_key(&first), list_key(&second)).unwrap();

    assert_eq!(outcome, ConnectOutcome::AnnotationOnly);
    assert_eq!(service.snapshot(), &before);
}

#[test]
fn gestures_against_unknown_node_keys_are_silent_no_ops() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let task_uuid = fixture.create_task(list_uuid, "Only task", 0).unwrap();

    let mut service = service_for(&conn, list_uuid);
    let before = service.snapshot().clone();
    let ghost = NodeKey::Artifact {
        kind: ArtifactKind::Note,
        owner: None,
        uuid: Uuid::new_v4(),
    };

    assert_eq!(
        service
            .connect(ghost, NodeKey::Task { uuid: task_uuid })
            .unwrap(),
        ConnectOutcome::StaleEndpoint
    );
    assert_eq!(
        service.request_detach(ghost).unwrap(),
        DetachOutcome::StaleNode
    );
    assert_eq!(
        service.request_delete(ghost).unwrap(),
        DeleteOutcome::StaleNode
    );
    assert_eq!(service.snapshot(), &before);
}

#[test]
fn tasks_and_the_start_node_are_never_detachable() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let task_uuid = fixture.create_task(list_uuid, "Pinned", 0).unwrap();
    let note = floating_note(&fixture, list_uuid, "floating");

    let mut service = service_for(&conn, list_uuid);

    assert_eq!(
        service
            .request_detach(NodeKey::Task { uuid: task_uuid })
            .unwrap(),
        DetachOutcome::NotDetachable
    );
    assert_eq!(
        service.request_detach(list_key(&note)).unwrap(),
        DetachOutcome::AlreadyListOwned
    );
}

#[test]
fn the_start_node_cannot_be_deleted() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    fixture.create_task(list_uuid, "Active only", 0).unwrap();

    let mut service = service_for(&conn, list_uuid);
    assert!(service.snapshot().contains(NodeKey::Start));
    assert_eq!(
        service.request_delete(NodeKey::Start).unwrap(),
        DeleteOutcome::NotDeletable
    );
}

#[test]
fn deleting_a_task_cascades_its_artifacts() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let task_uuid = fixture.create_task(list_uuid, "Doomed", 0).unwrap();
    fixture
        .create_artifact(
            &ArtifactPayload::Note {
                content: "goes too".to_string(),
            },
            Owner::Task(task_uuid),
        )
        .unwrap();
    fixture
        .create_artifact(
            &ArtifactPayload::Attachment {
                file_name: "also.zip".to_string(),
                file_path: "/tmp/also.zip".to_string(),
            },
            Owner::Task(task_uuid),
        )
        .unwrap();

    let mut service = service_for(&conn, list_uuid);
    let outcome = service
        .request_delete(NodeKey::Task { uuid: task_uuid })
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::TaskDeleted { task: task_uuid });

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM artifacts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
    assert!(!service
        .snapshot()
        .nodes
        .iter()
        .any(|node| node.payload.artifact().is_some()));
}

#[test]
fn deleting_an_artifact_removes_only_that_artifact() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let keep = floating_note(&fixture, list_uuid, "keep");
    let drop = floating_note(&fixture, list_uuid, "drop");

    let mut service = service_for(&conn, list_uuid);
    let outcome = service.request_delete(list_key(&drop)).unwrap();
    assert_eq!(outcome, DeleteOutcome::ArtifactDeleted { artifact: drop.uuid });

    let snapshot = service.snapshot();
    assert!(snapshot.contains(list_key(&keep)));
    assert!(!snapshot.contains(list_key(&drop)));
}

#[test]
fn dropped_files_become_attachments_and_url_marks_under_the_target() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let task_uuid = fixture.create_task(list_uuid, "Research", 0).unwrap();

    let mut service = service_for(&conn, list_uuid);
    let created = service
        .drop_files(
            &[
                DroppedFile::new(None, "/home/ada/report.pdf"),
                DroppedFile::new(Some("Handbook"), "https://handbook.example.com/v2"),
            ],
            Owner::Task(task_uuid),
        )
        .unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(created[0].kind(), ArtifactKind::Attachment);
    assert_eq!(created[1].kind(), ArtifactKind::UrlMark);
    for artifact in &created {
        assert_eq!(artifact.owner, Owner::Task(task_uuid));
    }

    let resource_edges = service
        .snapshot()
        .edges_from(NodeKey::Task { uuid: task_uuid })
        .into_iter()
        .filter(|edge| matches!(edge.kind, EdgeKind::Ownership { .. }))
        .count();
    assert_eq!(resource_edges, 2);
}

#[test]
fn dropping_onto_an_unknown_task_fails_without_creating_anything() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();

    let mut service = service_for(&conn, list_uuid);
    let error = service
        .drop_files(
            &[DroppedFile::new(None, "/tmp/lost.txt")],
            Owner::Task(Uuid::new_v4()),
        )
        .unwrap_err();

    assert!(matches!(error, TimelineError::OwnerNotFound(_)));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM artifacts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn external_change_notifications_mark_the_snapshot_stale() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();

    let mut service = service_for(&conn, list_uuid);
    assert!(!service.needs_rebuild());

    // External CRUD surface finished a task write.
    fixture.create_task(list_uuid, "Added elsewhere", 0).unwrap();
    service.notify_changed(taskline_core::ChangeCategory::Tasks);
    assert!(service.needs_rebuild());

    service.refresh().unwrap();
    assert!(!service.needs_rebuild());
    assert!(service.snapshot().contains(NodeKey::Start));
    assert_eq!(
        service
            .snapshot()
            .nodes
            .iter()
            .filter(|node| node.payload.task().is_some())
            .count(),
        1
    );
}

/// Store double whose owner writes always fail; reads pass through.
struct RejectingStore<'conn> {
    inner: SqliteRecordStore<'conn>,
}

impl RecordStore for RejectingStore<'_> {
    fn list_tasks(&self, list_uuid: ListId) -> StoreResult<Vec<Task>> {
        self.inner.list_tasks(list_uuid)
    }

    fn list_artifacts(&self, list_uuid: ListId, kind: ArtifactKind) -> StoreResult<Vec<Artifact>> {
        self.inner.list_artifacts(list_uuid, kind)
    }

    fn create_artifact(&self, payload: &ArtifactPayload, owner: Owner) -> StoreResult<Artifact> {
        self.inner.create_artifact(payload, owner)
    }

    fn set_artifact_owner(&self, _artifact: ArtifactId, _owner: Owner) -> StoreResult<Artifact> {
        Err(StoreError::InvalidData("injected write failure".to_string()))
    }

    fn delete_artifact(&self, artifact: ArtifactId) -> StoreResult<()> {
        self.inner.delete_artifact(artifact)
    }

    fn delete_task(&self, task: TaskId) -> StoreResult<()> {
        self.inner.delete_task(task)
    }
}

#[test]
fn a_rejected_owner_write_leaves_the_snapshot_untouched() {
    let conn = setup();
    let fixture = SqliteRecordStore::try_new(&conn).unwrap();
    let list_uuid = fixture.create_list("Board").unwrap();
    let task_uuid = fixture.create_task(list_uuid, "Target", 0).unwrap();
    let note = floating_note(&fixture, list_uuid, "stubborn");

    let store = RejectingStore {
        inner: SqliteRecordStore::try_new(&conn).unwrap(),
    };
    let mut service = TimelineService::new(store, list_uuid);
    service.refresh().unwrap();
    let before = service.snapshot().clone();

    let error = service
        .connect(list_key(&note), NodeKey::Task { uuid: task_uuid })
        .unwrap_err();
    assert!(matches!(error, TimelineError::Store(_)));
    assert_eq!(service.snapshot(), &before);

    let stored = fixture.get_artifact(note.uuid).unwrap().unwrap();
    assert_eq!(stored.owner, Owner::List(list_uuid));
}
