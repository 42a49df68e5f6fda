use crate::error::{Result, StoreError};
use crate::models::{new_project_id, timestamp_from_millis, Project};
use chrono::Utc;
use projkit_deps::Ecosystem;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::debug;

const PROJECT_COLUMNS: &str = "id, name, path, ecosystem, tool, created_at";

/// Project registry backed by SQLite
///
/// Owns the connection; dependency sync lives in `dependencies.rs`.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!("Opening project store at {}", db_path.display());
        Self::with_connection(Connection::open(db_path)?)
    }

    /// Throwaway store, mostly for tests
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // SQLite ships with foreign keys off; cascades depend on them
        conn.pragma_update(None, "foreign_keys", true)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                path TEXT NOT NULL UNIQUE,
                ecosystem TEXT NOT NULL,
                tool TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS dependencies (
                id INTEGER PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                name TEXT NOT NULL CHECK (length(name) > 0),
                version TEXT NOT NULL,
                dep_type TEXT NOT NULL CHECK (dep_type IN ('prod', 'dev')),
                created_at INTEGER NOT NULL,
                UNIQUE(project_id, name)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_dependencies_project ON dependencies(project_id)",
            [],
        )?;

        Ok(())
    }

    /// Register a project. The path must be absolute and not already tracked.
    pub fn create_project(
        &self,
        name: &str,
        path: &Path,
        ecosystem: Ecosystem,
        tool: &str,
    ) -> Result<Project> {
        if !path.is_absolute() {
            return Err(StoreError::InvalidProject(format!(
                "path must be absolute: {}",
                path.display()
            )));
        }
        if !ecosystem.supports_tool(tool) {
            return Err(StoreError::InvalidProject(format!(
                "{} is not a {} package manager",
                tool, ecosystem
            )));
        }
        if self.find_project_by_path(path)?.is_some() {
            return Err(StoreError::DuplicatePath(path.display().to_string()));
        }

        let project = Project {
            id: new_project_id(),
            name: name.to_string(),
            path: path.to_path_buf(),
            ecosystem,
            tool: tool.to_string(),
            created_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO projects (id, name, path, ecosystem, tool, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project.id,
                project.name,
                path_key(&project.path),
                project.ecosystem.as_str(),
                project.tool,
                project.created_at.timestamp_millis(),
            ],
        )?;

        debug!("Created project {} ({})", project.name, project.id);
        Ok(project)
    }

    pub fn get_project(&self, id: &str) -> Result<Project> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
        self.conn
            .query_row(&sql, params![id], project_from_row)
            .optional()?
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))
    }

    pub fn get_project_by_path(&self, path: &Path) -> Result<Project> {
        self.find_project_by_path(path)?
            .ok_or_else(|| StoreError::ProjectNotFound(path.display().to_string()))
    }

    fn find_project_by_path(&self, path: &Path) -> Result<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE path = ?1", PROJECT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![path_key(path)], project_from_row)
            .optional()?)
    }

    /// Every project with this display name, newest first. Names aren't unique.
    pub fn find_projects_by_name(&self, name: &str) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE name = ?1 ORDER BY created_at DESC, id DESC",
            PROJECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let projects = stmt
            .query_map(params![name], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    /// All projects, newest first
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects ORDER BY created_at DESC, id DESC",
            PROJECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    pub fn rename_project(&self, id: &str, new_name: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET name = ?1 WHERE id = ?2",
            params![new_name, id],
        )?;
        require_changed(changed, id)
    }

    /// Point the project at a different package manager of the same ecosystem
    pub fn set_project_tool(&self, id: &str, tool: &str) -> Result<()> {
        let project = self.get_project(id)?;
        if !project.ecosystem.supports_tool(tool) {
            return Err(StoreError::InvalidProject(format!(
                "{} is not a {} package manager",
                tool, project.ecosystem
            )));
        }

        let changed = self.conn.execute(
            "UPDATE projects SET tool = ?1 WHERE id = ?2",
            params![tool, id],
        )?;
        require_changed(changed, id)
    }

    /// Remove a project and, through the cascade, all of its dependency rows
    pub fn delete_project(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        require_changed(changed, id)
    }
}

fn require_changed(changed: usize, id: &str) -> Result<()> {
    if changed == 0 {
        Err(StoreError::ProjectNotFound(id.to_string()))
    } else {
        Ok(())
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let path: String = row.get(2)?;
    let ecosystem: String = row.get(3)?;
    let ecosystem = ecosystem
        .parse::<Ecosystem>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        path: PathBuf::from(path),
        ecosystem,
        tool: row.get(4)?,
        created_at: timestamp_from_millis(row.get(5)?),
    })
}
