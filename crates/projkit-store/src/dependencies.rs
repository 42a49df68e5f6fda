use crate::error::{Result, StoreError};
use crate::models::{timestamp_from_millis, StoredDependency};
use crate::store::Store;
use chrono::Utc;
use projkit_deps::{DependencyKind, DependencySet};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

impl Store {
    /// Replace every stored dependency of a project with `deps`.
    ///
    /// Delete and inserts run in one transaction. If any insert fails the
    /// transaction is rolled back on drop and the previous rows stay as they
    /// were. Returns the number of rows written.
    pub fn sync_dependencies(&mut self, project_id: &str, deps: &DependencySet) -> Result<usize> {
        let tx = self.conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM projects WHERE id = ?1",
                params![project_id],
                |_| Ok(()),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::ProjectNotFound(project_id.to_string()));
        }

        let removed = tx.execute(
            "DELETE FROM dependencies WHERE project_id = ?1",
            params![project_id],
        )?;

        let now = Utc::now().timestamp_millis();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO dependencies (project_id, name, version, dep_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for dep in deps.values() {
                stmt.execute(params![project_id, dep.name, dep.version, dep.kind.as_str(), now])?;
            }
        }

        tx.commit()?;

        debug!("Removed {} stale dependency rows for {}", removed, project_id);
        info!("Synced {} dependencies for project {}", deps.len(), project_id);
        Ok(deps.len())
    }

    /// Stored dependencies of a project, dev first, then by name
    pub fn dependencies(&self, project_id: &str) -> Result<Vec<StoredDependency>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, name, version, dep_type, created_at
             FROM dependencies
             WHERE project_id = ?1
             ORDER BY dep_type, name",
        )?;

        let rows = stmt
            .query_map(params![project_id], |row| {
                let dep_type: String = row.get(4)?;
                let kind = dep_type.parse::<DependencyKind>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into())
                })?;

                Ok(StoredDependency {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    name: row.get(2)?,
                    version: row.get(3)?,
                    kind,
                    created_at: timestamp_from_millis(row.get(5)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Stored dependencies in the same shape the parsers produce
    pub fn dependency_set(&self, project_id: &str) -> Result<DependencySet> {
        Ok(self
            .dependencies(project_id)?
            .into_iter()
            .map(|row| (row.name.clone(), row.to_dependency()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Project;
    use projkit_deps::{parsers::parse_package_json, Dependency, Ecosystem};

    fn store_with_project() -> (Store, Project) {
        let store = Store::in_memory().unwrap();
        let project = store
            .create_project(
                "web",
                &std::env::temp_dir().join("web"),
                Ecosystem::JavaScript,
                "npm",
            )
            .unwrap();
        (store, project)
    }

    fn set(deps: &[Dependency]) -> DependencySet {
        deps.iter().map(|d| (d.name.clone(), d.clone())).collect()
    }

    #[test]
    fn test_sync_parsed_package_json() {
        let (mut store, project) = store_with_project();
        let deps = parse_package_json(
            r#"{"dependencies":{"react":"^18.0.0"},"devDependencies":{"typescript":"^5.0.0"}}"#,
        )
        .unwrap();

        assert_eq!(store.sync_dependencies(&project.id, &deps).unwrap(), 2);

        let rows = store.dependencies(&project.id).unwrap();
        assert_eq!(rows.len(), 2);
        // dev sorts before prod
        assert_eq!(rows[0].name, "typescript");
        assert_eq!(rows[0].version, "^5.0.0");
        assert_eq!(rows[0].kind, DependencyKind::Development);
        assert_eq!(rows[1].name, "react");
        assert_eq!(rows[1].version, "^18.0.0");
        assert_eq!(rows[1].kind, DependencyKind::Production);
        assert!(rows.iter().all(|r| r.project_id == project.id));
    }

    #[test]
    fn test_sync_replaces_previous_snapshot() {
        let (mut store, project) = store_with_project();
        let first = set(&[
            Dependency::production("express", "^4.18.0"),
            Dependency::production("lodash", "^4.17.21"),
        ]);
        let second = set(&[
            Dependency::production("fastify", "^4.0.0"),
            Dependency::development("vitest", "^1.0.0"),
        ]);

        store.sync_dependencies(&project.id, &first).unwrap();
        store.sync_dependencies(&project.id, &second).unwrap();

        assert_eq!(store.dependency_set(&project.id).unwrap(), second);
    }

    #[test]
    fn test_failed_insert_keeps_previous_rows() {
        let (mut store, project) = store_with_project();
        let original = set(&[
            Dependency::production("react", "^18.0.0"),
            Dependency::development("typescript", "^5.0.0"),
        ]);
        store.sync_dependencies(&project.id, &original).unwrap();

        // The empty name violates the schema and fails after "axios" went in
        let mut broken = set(&[Dependency::production("axios", "^1.6.0")]);
        broken.insert("zzz".to_string(), Dependency::production("", "1.0.0"));

        let result = store.sync_dependencies(&project.id, &broken);
        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(store.dependency_set(&project.id).unwrap(), original);
    }

    #[test]
    fn test_sync_unknown_project() {
        let (mut store, _) = store_with_project();
        let result = store.sync_dependencies("missing", &DependencySet::new());
        assert!(matches!(result, Err(StoreError::ProjectNotFound(_))));
    }

    #[test]
    fn test_sync_empty_set_clears_rows() {
        let (mut store, project) = store_with_project();
        store
            .sync_dependencies(&project.id, &set(&[Dependency::production("a", "1")]))
            .unwrap();

        store.sync_dependencies(&project.id, &DependencySet::new()).unwrap();
        assert!(store.dependencies(&project.id).unwrap().is_empty());
    }

    #[test]
    fn test_projects_do_not_share_rows() {
        let (mut store, web) = store_with_project();
        let api = store
            .create_project("api", &std::env::temp_dir().join("api"), Ecosystem::Go, "go")
            .unwrap();

        store
            .sync_dependencies(&web.id, &set(&[Dependency::production("react", "18")]))
            .unwrap();
        store
            .sync_dependencies(&api.id, &set(&[Dependency::production("github.com/x/y", "v1.0.0")]))
            .unwrap();
        store.sync_dependencies(&web.id, &DependencySet::new()).unwrap();

        assert!(store.dependencies(&web.id).unwrap().is_empty());
        assert_eq!(store.dependencies(&api.id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_project_cascades() {
        let (mut store, project) = store_with_project();
        store
            .sync_dependencies(&project.id, &set(&[Dependency::production("react", "18")]))
            .unwrap();

        store.delete_project(&project.id).unwrap();

        let orphans: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM dependencies", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
