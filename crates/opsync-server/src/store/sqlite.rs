//! SQLite-based task store.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;
use tracing::info;

use opsync_core::{CanonicalTask, ExternalId, StoredTask};

use super::{StoreError, TaskFilter, TaskStore, UpsertOutcome};

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT,
    title TEXT NOT NULL,
    description TEXT,
    project TEXT,
    project_id TEXT,
    status TEXT DEFAULT 'pending',
    assignee TEXT,
    responsible TEXT,
    priority TEXT,
    estimated_hours REAL,
    spent_hours REAL,
    related_to TEXT,
    op_created_at TEXT,
    op_updated_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_external_id ON tasks(external_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project);
CREATE INDEX IF NOT EXISTS idx_tasks_project_id ON tasks(project_id);
CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks(assignee);
CREATE INDEX IF NOT EXISTS idx_tasks_op_updated_at ON tasks(op_updated_at);
CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority);
"#;

const COLUMNS: &str = "id, external_id, title, description, project, project_id, status, \
     assignee, responsible, priority, estimated_hours, spent_hours, related_to, \
     op_created_at, op_updated_at, created_at, updated_at";

const RELATED_TO_COLUMN: usize = 12;

pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    /// Open (or create) the database file and apply the schema.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(SCHEMA)?;
            Ok::<_, StoreError>(conn)
        })
        .await??;

        info!(path = %path.display(), "SQLite task store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut conn)
        })
        .await?
    }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<StoredTask> {
    let related: Option<String> = row.get(RELATED_TO_COLUMN)?;
    let related_to = CanonicalTask::parse_related_to(related.as_deref()).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(RELATED_TO_COLUMN, Type::Text, Box::new(e))
    })?;

    Ok(StoredTask {
        id: row.get(0)?,
        task: CanonicalTask {
            external_id: ExternalId::new(row.get::<_, Option<String>>(1)?.unwrap_or_default()),
            title: row.get(2)?,
            description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            project: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            project_id: row.get(5)?,
            status: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            assignee: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            responsible: row.get(8)?,
            priority: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            estimated_hours: row.get(10)?,
            spent_hours: row.get(11)?,
            related_to,
            op_created_at: row.get(13)?,
            op_updated_at: row.get(14)?,
        },
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<StoredTask>, StoreError> {
        let key = external_id.as_str().to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {COLUMNS} FROM tasks WHERE external_id = ?1");
            let task = conn
                .query_row(&sql, params![key], row_to_task)
                .optional()?;
            Ok(task)
        })
        .await
    }

    async fn upsert_by_external_id(
        &self,
        task: &CanonicalTask,
    ) -> Result<UpsertOutcome, StoreError> {
        if task.external_id.is_empty() {
            return Err(StoreError::MissingExternalId);
        }

        let task = task.clone();
        self.with_conn(move |conn| {
            let related_to = task.related_to_json()?;
            let now = Utc::now();
            let tx = conn.transaction()?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM tasks WHERE external_id = ?1",
                    params![task.external_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE tasks SET title = ?1, description = ?2, project = ?3,
                             project_id = ?4, status = ?5, assignee = ?6, responsible = ?7,
                             priority = ?8, estimated_hours = ?9, spent_hours = ?10,
                             related_to = ?11, op_created_at = ?12, op_updated_at = ?13,
                             updated_at = ?14
                         WHERE id = ?15",
                        params![
                            task.title,
                            task.description,
                            task.project,
                            task.project_id,
                            task.status,
                            task.assignee,
                            task.responsible,
                            task.priority,
                            task.estimated_hours,
                            task.spent_hours,
                            related_to,
                            task.op_created_at,
                            task.op_updated_at,
                            now,
                            id,
                        ],
                    )?;
                    UpsertOutcome {
                        id,
                        was_update: true,
                    }
                }
                None => {
                    tx.execute(
                        "INSERT INTO tasks (external_id, title, description, project, project_id,
                             status, assignee, responsible, priority, estimated_hours,
                             spent_hours, related_to, op_created_at, op_updated_at,
                             created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                        params![
                            task.external_id.as_str(),
                            task.title,
                            task.description,
                            task.project,
                            task.project_id,
                            task.status,
                            task.assignee,
                            task.responsible,
                            task.priority,
                            task.estimated_hours,
                            task.spent_hours,
                            related_to,
                            task.op_created_at,
                            task.op_updated_at,
                            now,
                            now,
                        ],
                    )?;
                    UpsertOutcome {
                        id: tx.last_insert_rowid(),
                        was_update: false,
                    }
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<StoredTask>, StoreError> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1");
            let task = conn.query_row(&sql, params![id], row_to_task).optional()?;
            Ok(task)
        })
        .await
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<StoredTask>, StoreError> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let mut sql = format!("SELECT {COLUMNS} FROM tasks WHERE 1 = 1");
            let mut values: Vec<String> = Vec::new();

            for (column, value) in [
                ("status", &filter.status),
                ("assignee", &filter.assignee),
                ("project_id", &filter.project_id),
            ] {
                if let Some(value) = value {
                    values.push(value.clone());
                    sql.push_str(&format!(" AND {} = ?{}", column, values.len()));
                }
            }
            sql.push_str(" ORDER BY op_updated_at IS NULL, op_updated_at DESC, updated_at DESC");
            sql.push_str(&format!(" LIMIT {}", filter.limit()));

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(values.iter()), row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
        .await
    }

    async fn count_by_status(&self) -> Result<Vec<(String, u64)>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT COALESCE(status, ''), COUNT(*) FROM tasks GROUP BY status ORDER BY status",
            )?;
            let counts = stmt
                .query_map([], |row| {
                    let status: String = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    Ok((status, count.max(0) as u64))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(counts)
        })
        .await
    }
}
