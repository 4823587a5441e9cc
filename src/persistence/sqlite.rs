use crate::item::{Item, ItemId};
use crate::metadata::ProjectMetadata;
use crate::milestone::{Milestone, MilestoneFields, MilestoneId, MilestoneStatus, ProjectId};
use crate::store::{ScheduleBackend, StoreError, StoreResult};
use crate::visibility::VisibilityLevel;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::str::FromStr;

const MILESTONE_COLUMNS: &str = "id, project_id, title, start_date, end_date, description, color, \
     event_type, status, created_by, created_at";

const ITEM_COLUMNS: &str = "id, kind, title, status, priority, task_type";

pub struct SqliteScheduleStore {
    connection: Mutex<Connection>,
}

/// Raw milestone row; enum columns are parsed after the query finishes.
struct MilestoneRow {
    id: MilestoneId,
    project_id: ProjectId,
    title: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    description: Option<String>,
    color: Option<String>,
    event_type: String,
    status: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl MilestoneRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            title: row.get(2)?,
            start_date: row.get(3)?,
            end_date: row.get(4)?,
            description: row.get(5)?,
            color: row.get(6)?,
            event_type: row.get(7)?,
            status: row.get(8)?,
            created_by: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_milestone(self) -> StoreResult<Milestone> {
        Ok(Milestone {
            id: self.id,
            project_id: self.project_id,
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            description: self.description,
            color: self.color,
            event_type: parse_column("event_type", &self.event_type)?,
            status: parse_column("status", &self.status)?,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

struct ItemRow {
    id: ItemId,
    kind: String,
    title: String,
    status: String,
    priority: String,
    task_type: Option<String>,
}

impl ItemRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            title: row.get(2)?,
            status: row.get(3)?,
            priority: row.get(4)?,
            task_type: row.get(5)?,
        })
    }

    fn into_item(self) -> StoreResult<Item> {
        Ok(Item {
            id: self.id,
            kind: parse_column("kind", &self.kind)?,
            title: self.title,
            status: parse_column("status", &self.status)?,
            priority: parse_column("priority", &self.priority)?,
            task_type: self.task_type,
        })
    }
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> StoreResult<T> {
    T::from_str(value)
        .map_err(|_| StoreError::InvalidData(format!("unexpected {column} value '{value}'")))
}

impl SqliteScheduleStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> StoreResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> StoreResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> StoreResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                metadata_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS milestones (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                description TEXT,
                color TEXT,
                event_type TEXT NOT NULL,
                status TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS milestones_project_start
                ON milestones (project_id, start_date);
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                task_type TEXT
            );
            CREATE TABLE IF NOT EXISTS milestone_tasks (
                milestone_id INTEGER NOT NULL REFERENCES milestones (id) ON DELETE CASCADE,
                task_id INTEGER NOT NULL,
                PRIMARY KEY (milestone_id, task_id)
            );
            CREATE TABLE IF NOT EXISTS milestone_visibility (
                milestone_id INTEGER PRIMARY KEY REFERENCES milestones (id) ON DELETE CASCADE,
                level TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    pub fn upsert_item(&self, item: &Item) -> StoreResult<()> {
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO items (id, kind, title, status, priority, task_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (id) DO UPDATE SET
                kind = excluded.kind,
                title = excluded.title,
                status = excluded.status,
                priority = excluded.priority,
                task_type = excluded.task_type",
            params![
                item.id,
                item.kind.to_string(),
                item.title,
                item.status.to_string(),
                item.priority.to_string(),
                item.task_type,
            ],
        )?;
        Ok(())
    }

    fn fetch_milestone(conn: &Connection, milestone_id: MilestoneId) -> StoreResult<Milestone> {
        let sql = format!("SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = ?1");
        let row = conn
            .query_row(&sql, params![milestone_id], MilestoneRow::from_row)
            .optional()?
            .ok_or_else(|| StoreError::milestone_not_found(milestone_id))?;
        row.into_milestone()
    }

    fn milestone_exists(conn: &Connection, milestone_id: MilestoneId) -> StoreResult<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM milestones WHERE id = ?1",
                params![milestone_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl ScheduleBackend for SqliteScheduleStore {
    fn list_milestones(&self, project_id: ProjectId) -> StoreResult<Vec<Milestone>> {
        let conn = self.connection.lock();
        let sql = format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE project_id = ?1 \
             ORDER BY start_date ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![project_id], MilestoneRow::from_row)?;
        let mut milestones = Vec::new();
        for row in rows {
            milestones.push(row?.into_milestone()?);
        }
        Ok(milestones)
    }

    fn list_milestone_links(&self, milestone_id: MilestoneId) -> StoreResult<Vec<ItemId>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT task_id FROM milestone_tasks WHERE milestone_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![milestone_id], |row| row.get::<_, ItemId>(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }

    fn list_items_by_ids(&self, ids: &[ItemId]) -> StoreResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.connection.lock();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id IN ({placeholders}) ORDER BY id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), ItemRow::from_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?.into_item()?);
        }
        Ok(items)
    }

    fn list_items(&self) -> StoreResult<Vec<Item>> {
        let conn = self.connection.lock();
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], ItemRow::from_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?.into_item()?);
        }
        Ok(items)
    }

    fn create_milestone(
        &self,
        project_id: ProjectId,
        fields: &MilestoneFields,
        created_by: &str,
    ) -> StoreResult<Milestone> {
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO milestones (project_id, title, start_date, end_date, description, color,
                event_type, status, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                project_id,
                fields.title,
                fields.start_date,
                fields.end_date,
                fields.description,
                fields.color,
                fields.event_type.to_string(),
                MilestoneStatus::Scheduled.to_string(),
                created_by,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        Self::fetch_milestone(&conn, id)
    }

    fn update_milestone(
        &self,
        milestone_id: MilestoneId,
        fields: &MilestoneFields,
    ) -> StoreResult<Milestone> {
        let conn = self.connection.lock();
        let changed = conn.execute(
            "UPDATE milestones SET title = ?2, start_date = ?3, end_date = ?4, description = ?5,
                color = ?6, event_type = ?7
             WHERE id = ?1",
            params![
                milestone_id,
                fields.title,
                fields.start_date,
                fields.end_date,
                fields.description,
                fields.color,
                fields.event_type.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::milestone_not_found(milestone_id));
        }
        Self::fetch_milestone(&conn, milestone_id)
    }

    fn set_milestone_status(
        &self,
        milestone_id: MilestoneId,
        status: MilestoneStatus,
    ) -> StoreResult<Milestone> {
        let conn = self.connection.lock();
        let changed = conn.execute(
            "UPDATE milestones SET status = ?2 WHERE id = ?1",
            params![milestone_id, status.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::milestone_not_found(milestone_id));
        }
        Self::fetch_milestone(&conn, milestone_id)
    }

    fn delete_milestone(&self, milestone_id: MilestoneId) -> StoreResult<()> {
        let conn = self.connection.lock();
        let changed = conn.execute("DELETE FROM milestones WHERE id = ?1", params![milestone_id])?;
        if changed == 0 {
            return Err(StoreError::milestone_not_found(milestone_id));
        }
        Ok(())
    }

    fn replace_milestone_links(
        &self,
        milestone_id: MilestoneId,
        item_ids: &[ItemId],
    ) -> StoreResult<()> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        if !Self::milestone_exists(&tx, milestone_id)? {
            return Err(StoreError::milestone_not_found(milestone_id));
        }
        tx.execute(
            "DELETE FROM milestone_tasks WHERE milestone_id = ?1",
            params![milestone_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO milestone_tasks (milestone_id, task_id) VALUES (?1, ?2)",
            )?;
            for item_id in item_ids {
                stmt.execute(params![milestone_id, item_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn set_visibility(
        &self,
        milestone_id: MilestoneId,
        level: VisibilityLevel,
    ) -> StoreResult<()> {
        let conn = self.connection.lock();
        if !Self::milestone_exists(&conn, milestone_id)? {
            return Err(StoreError::milestone_not_found(milestone_id));
        }
        conn.execute(
            "INSERT INTO milestone_visibility (milestone_id, level) VALUES (?1, ?2)
             ON CONFLICT (milestone_id) DO UPDATE SET level = excluded.level",
            params![milestone_id, level.to_string()],
        )?;
        Ok(())
    }

    fn visibility(&self, milestone_id: MilestoneId) -> StoreResult<Option<VisibilityLevel>> {
        let conn = self.connection.lock();
        let level: Option<String> = conn
            .query_row(
                "SELECT level FROM milestone_visibility WHERE milestone_id = ?1",
                params![milestone_id],
                |row| row.get(0),
            )
            .optional()?;
        level
            .map(|value| parse_column("level", &value))
            .transpose()
    }

    fn load_project(&self, project_id: ProjectId) -> StoreResult<Option<ProjectMetadata>> {
        let conn = self.connection.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT metadata_json FROM projects WHERE id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(json) = json else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save_project(&self, project_id: ProjectId, metadata: &ProjectMetadata) -> StoreResult<()> {
        let json = serde_json::to_string(metadata)?;
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO projects (id, metadata_json) VALUES (?1, ?2)
             ON CONFLICT (id) DO UPDATE SET metadata_json = excluded.metadata_json",
            params![project_id, json],
        )?;
        Ok(())
    }
}
