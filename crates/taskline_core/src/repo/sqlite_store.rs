//! SQLite-backed Record Store implementation.
//!
//! # Responsibility
//! - Provide the `RecordStore` contract over the `lists`/`tasks`/
//!   `artifacts` schema, plus the minimal task-CRUD surface the board UI
//!   uses.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Read orderings are deterministic (`sort_order ASC, uuid ASC` for
//!   tasks; `created_at ASC, uuid ASC` for artifacts).
//! - Ownership is persisted as the raw column pair; rows where the pair
//!   is not exactly-one-set are skipped with a diagnostic during reads so
//!   one bad row never aborts a rebuild.
//! - Mutations are followed by a read-back of the stored record.

use crate::db::migrations::latest_version;
use crate::model::artifact::{Artifact, ArtifactId, ArtifactKind, ArtifactPayload, Owner};
use crate::model::task::{ListId, Stage, Task, TaskId};
use crate::repo::record_store::{RecordStore, StoreError, StoreResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const ARTIFACT_SELECT_SQL: &str = "SELECT
    artifact_uuid,
    kind,
    content,
    file_name,
    file_path,
    url,
    url_name,
    owner_task_uuid,
    owner_list_uuid
FROM artifacts";

/// SQLite-backed record store over a migrated connection.
#[derive(Debug)]
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Wraps a connection after checking it is at the expected schema
    /// version (i.e. it came out of `open_db`/`open_db_in_memory`).
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let actual = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        let expected = latest_version();
        if actual != expected {
            return Err(StoreError::SchemaVersion { expected, actual });
        }
        Ok(Self { conn })
    }

    /// Creates a list and returns its stable id.
    pub fn create_list(&self, title: &str) -> StoreResult<ListId> {
        let list_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO lists (list_uuid, title) VALUES (?1, ?2);",
            params![list_uuid.to_string(), title],
        )?;
        Ok(list_uuid)
    }

    /// Creates a task in `Stage::Todo` and returns its stable id.
    pub fn create_task(&self, list_uuid: ListId, title: &str, sort_order: i64) -> StoreResult<TaskId> {
        self.ensure_list(list_uuid)?;
        let task_uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO tasks (task_uuid, list_uuid, title, stage, sort_order)
             VALUES (?1, ?2, ?3, 'todo', ?4);",
            params![
                task_uuid.to_string(),
                list_uuid.to_string(),
                title,
                sort_order
            ],
        )?;
        Ok(task_uuid)
    }

    /// Moves a task to `stage`; entering the terminal stage sets
    /// `completed_at` once, leaving it clears the timestamp.
    pub fn set_task_stage(&self, task_uuid: TaskId, stage: Stage) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                stage = ?1,
                completed_at = CASE
                    WHEN ?1 = 'done'
                        THEN COALESCE(completed_at, strftime('%s', 'now') * 1000)
                    ELSE NULL
                END,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE task_uuid = ?2;",
            params![stage_to_db(stage), task_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::TaskNotFound(task_uuid));
        }
        Ok(())
    }

    /// Rewrites a task's manual position within its stage.
    pub fn set_task_order(&self, task_uuid: TaskId, sort_order: i64) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET sort_order = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE task_uuid = ?2;",
            params![sort_order, task_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::TaskNotFound(task_uuid));
        }
        Ok(())
    }

    /// Fetches one artifact; skipped (malformed) rows read as `None`.
    pub fn get_artifact(&self, artifact_uuid: ArtifactId) -> StoreResult<Option<Artifact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTIFACT_SELECT_SQL} WHERE artifact_uuid = ?1;"))?;
        let mut rows = stmt.query(params![artifact_uuid.to_string()])?;
        match rows.next()? {
            Some(row) => parse_artifact_row(row),
            None => Ok(None),
        }
    }

    fn ensure_list(&self, list_uuid: ListId) -> StoreResult<()> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM lists WHERE list_uuid = ?1;",
                params![list_uuid.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if found.is_none() {
            return Err(StoreError::ListNotFound(list_uuid));
        }
        Ok(())
    }

    fn task_list(&self, task_uuid: TaskId) -> StoreResult<ListId> {
        let list_text: Option<String> = self
            .conn
            .query_row(
                "SELECT list_uuid FROM tasks WHERE task_uuid = ?1;",
                params![task_uuid.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match list_text {
            Some(text) => parse_uuid(&text, "tasks.list_uuid"),
            None => Err(StoreError::TaskNotFound(task_uuid)),
        }
    }

    fn owned_artifacts(&self, task_uuid: TaskId) -> StoreResult<Vec<Artifact>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARTIFACT_SELECT_SQL}
             WHERE owner_task_uuid = ?1
             ORDER BY created_at ASC, artifact_uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![task_uuid.to_string()])?;
        let mut artifacts = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(artifact) = parse_artifact_row(row)? {
                artifacts.push(artifact);
            }
        }
        Ok(artifacts)
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn list_tasks(&self, list_uuid: ListId) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_uuid, list_uuid, title, stage, sort_order, completed_at
             FROM tasks
             WHERE list_uuid = ?1
             ORDER BY sort_order ASC, task_uuid ASC;",
        )?;
        let mut rows = stmt.query(params![list_uuid.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        for task in &mut tasks {
            for artifact in self.owned_artifacts(task.uuid)? {
                match artifact.kind() {
                    ArtifactKind::Note => task.notes.push(artifact),
                    ArtifactKind::Attachment => task.attachments.push(artifact),
                    ArtifactKind::UrlMark => task.url_marks.push(artifact),
                }
            }
        }

        Ok(tasks)
    }

    fn list_artifacts(&self, list_uuid: ListId, kind: ArtifactKind) -> StoreResult<Vec<Artifact>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARTIFACT_SELECT_SQL}
             WHERE owner_list_uuid = ?1 AND kind = ?2
             ORDER BY created_at ASC, artifact_uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![list_uuid.to_string(), kind.as_str()])?;
        let mut artifacts = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(artifact) = parse_artifact_row(row)? {
                artifacts.push(artifact);
            }
        }
        Ok(artifacts)
    }

    fn create_artifact(&self, payload: &ArtifactPayload, owner: Owner) -> StoreResult<Artifact> {
        let list_uuid = match owner {
            Owner::List(list_uuid) => {
                self.ensure_list(list_uuid)?;
                list_uuid
            }
            Owner::Task(task_uuid) => self.task_list(task_uuid)?,
        };

        let artifact_uuid = Uuid::new_v4();
        let (content, file_name, file_path, url, url_name) = payload_columns(payload);
        let (owner_task, owner_list) = owner_columns(owner);
        self.conn.execute(
            "INSERT INTO artifacts (
                artifact_uuid,
                list_uuid,
                kind,
                content,
                file_name,
                file_path,
                url,
                url_name,
                owner_task_uuid,
                owner_list_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                artifact_uuid.to_string(),
                list_uuid.to_string(),
                payload.kind().as_str(),
                content,
                file_name,
                file_path,
                url,
                url_name,
                owner_task,
                owner_list,
            ],
        )?;

        self.get_artifact(artifact_uuid)?.ok_or_else(|| {
            StoreError::InvalidData("created artifact not found in read-back".to_string())
        })
    }

    fn set_artifact_owner(&self, artifact_uuid: ArtifactId, owner: Owner) -> StoreResult<Artifact> {
        match owner {
            Owner::List(list_uuid) => self.ensure_list(list_uuid)?,
            Owner::Task(task_uuid) => {
                self.task_list(task_uuid)?;
            }
        }

        let (owner_task, owner_list) = owner_columns(owner);
        let changed = self.conn.execute(
            "UPDATE artifacts
             SET
                owner_task_uuid = ?1,
                owner_list_uuid = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE artifact_uuid = ?3;",
            params![owner_task, owner_list, artifact_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::ArtifactNotFound(artifact_uuid));
        }

        self.get_artifact(artifact_uuid)?.ok_or_else(|| {
            StoreError::InvalidData("artifact missing after owner update".to_string())
        })
    }

    fn delete_artifact(&self, artifact_uuid: ArtifactId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM artifacts WHERE artifact_uuid = ?1;",
            params![artifact_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::ArtifactNotFound(artifact_uuid));
        }
        Ok(())
    }

    fn delete_task(&self, task_uuid: TaskId) -> StoreResult<()> {
        // Owned artifacts go with the task via the schema's cascade rule.
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE task_uuid = ?1;",
            params![task_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::TaskNotFound(task_uuid));
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let uuid_text: String = row.get("task_uuid")?;
    let list_text: String = row.get("list_uuid")?;
    let stage_text: String = row.get("stage")?;
    let stage = parse_stage(&stage_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid stage `{stage_text}` in tasks.stage"))
    })?;

    Ok(Task {
        uuid: parse_uuid(&uuid_text, "tasks.task_uuid")?,
        list_uuid: parse_uuid(&list_text, "tasks.list_uuid")?,
        title: row.get("title")?,
        stage,
        sort_order: row.get("sort_order")?,
        completed_at: row.get("completed_at")?,
        notes: Vec::new(),
        attachments: Vec::new(),
        url_marks: Vec::new(),
    })
}

/// Parses one artifact row. Returns `Ok(None)` for rows this build cannot
/// represent (malformed owner pair, unknown kind, missing payload column);
/// those are logged and skipped so a rebuild survives one bad row.
fn parse_artifact_row(row: &Row<'_>) -> StoreResult<Option<Artifact>> {
    let uuid_text: String = row.get("artifact_uuid")?;
    let uuid = parse_uuid(&uuid_text, "artifacts.artifact_uuid")?;

    let owner_task: Option<String> = row.get("owner_task_uuid")?;
    let owner_list: Option<String> = row.get("owner_list_uuid")?;
    let owner = match (owner_task, owner_list) {
        (Some(task_text), None) => match Uuid::parse_str(&task_text) {
            Ok(task_uuid) => Owner::Task(task_uuid),
            Err(_) => return Ok(skip_row(uuid, "malformed_owner")),
        },
        (None, Some(list_text)) => match Uuid::parse_str(&list_text) {
            Ok(list_uuid) => Owner::List(list_uuid),
            Err(_) => return Ok(skip_row(uuid, "malformed_owner")),
        },
        (Some(_), Some(_)) | (None, None) => return Ok(skip_row(uuid, "malformed_owner")),
    };

    let kind_text: String = row.get("kind")?;
    let payload = match kind_text.as_str() {
        "note" => match row.get::<_, Option<String>>("content")? {
            Some(content) => ArtifactPayload::Note { content },
            None => return Ok(skip_row(uuid, "missing_payload")),
        },
        "attachment" => {
            let file_name: Option<String> = row.get("file_name")?;
            let file_path: Option<String> = row.get("file_path")?;
            match (file_name, file_path) {
                (Some(file_name), Some(file_path)) => ArtifactPayload::Attachment {
                    file_name,
                    file_path,
                },
                _ => return Ok(skip_row(uuid, "missing_payload")),
            }
        }
        "url_mark" => {
            let url: Option<String> = row.get("url")?;
            let url_name: Option<String> = row.get("url_name")?;
            match (url, url_name) {
                (Some(url), Some(name)) => ArtifactPayload::UrlMark { url, name },
                _ => return Ok(skip_row(uuid, "missing_payload")),
            }
        }
        _ => return Ok(skip_row(uuid, "unknown_kind")),
    };

    Ok(Some(Artifact {
        uuid,
        payload,
        owner,
    }))
}

fn skip_row(artifact_uuid: ArtifactId, error_code: &str) -> Option<Artifact> {
    warn!(
        "event=artifact_row_skipped module=store status=skip error_code={error_code} artifact={artifact_uuid}"
    );
    None
}

fn parse_uuid(text: &str, column: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(text)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn payload_columns(
    payload: &ArtifactPayload,
) -> (
    Option<&str>,
    Option<&str>,
    Option<&str>,
    Option<&str>,
    Option<&str>,
) {
    match payload {
        ArtifactPayload::Note { content } => (Some(content), None, None, None, None),
        ArtifactPayload::Attachment {
            file_name,
            file_path,
        } => (None, Some(file_name), Some(file_path), None, None),
        ArtifactPayload::UrlMark { url, name } => (None, None, None, Some(url), Some(name)),
    }
}

fn owner_columns(owner: Owner) -> (Option<String>, Option<String>) {
    match owner {
        Owner::Task(task_uuid) => (Some(task_uuid.to_string()), None),
        Owner::List(list_uuid) => (None, Some(list_uuid.to_string())),
    }
}

fn stage_to_db(stage: Stage) -> &'static str {
    match stage {
        Stage::Todo => "todo",
        Stage::InProgress => "in_progress",
        Stage::Done => "done",
    }
}

fn parse_stage(value: &str) -> Option<Stage> {
    match value {
        "todo" => Some(Stage::Todo),
        "in_progress" => Some(Stage::InProgress),
        "done" => Some(Stage::Done),
        _ => None,
    }
}
