use crate::config::Config;
use crate::error::Error;
use crate::Result;
use projkit_deps::{parse_project, DependencySummary, Ecosystem};
use projkit_pm::{PackageManager, Registry};
use projkit_store::{is_project_id, Project, Store, StoreError, StoredDependency};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The operations behind every command: find a project, drive its package
/// manager, keep the stored dependency snapshot in line with the manifest
pub struct Tracker {
    store: Store,
    registry: Registry,
}

impl Tracker {
    pub fn new(store: Store, registry: Registry) -> Self {
        Self { store, registry }
    }

    /// Open the configured database with the real package managers
    pub fn open(config: &Config) -> Result<Self> {
        let store = Store::open(config.database_path()?)?;
        Ok(Self::new(store, Registry::system()))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve a project reference relative to the current directory
    pub fn resolve(&self, input: &str) -> Result<Project> {
        let cwd = std::env::current_dir()?;
        self.resolve_from(input, &cwd)
    }

    /// Turn what the user typed into a project
    ///
    /// `.` is whatever project contains `cwd`. Something shaped like an id is
    /// tried as one first. Otherwise it's a name, and since names aren't
    /// unique, several matches are an error for the caller to sort out.
    pub fn resolve_from(&self, input: &str, cwd: &Path) -> Result<Project> {
        if input == "." {
            return self.project_containing(cwd);
        }

        if is_project_id(input) {
            match self.store.get_project(input) {
                Ok(project) => return Ok(project),
                Err(StoreError::ProjectNotFound(_)) => {
                    debug!("No project with id {}, trying it as a name", input)
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut matches = self.store.find_projects_by_name(input)?;
        match matches.len() {
            0 => Err(Error::ProjectNotFound(input.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousProject {
                name: input.to_string(),
                candidates: matches,
            }),
        }
    }

    /// The tracked project at `dir` or the closest one above it
    pub fn project_containing(&self, dir: &Path) -> Result<Project> {
        let dir = absolute(dir)?;
        for candidate in dir.ancestors() {
            match self.store.get_project_by_path(candidate) {
                Ok(project) => return Ok(project),
                Err(StoreError::ProjectNotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::ProjectNotFound(format!(
            "{} is not inside a tracked project",
            dir.display()
        )))
    }

    pub fn list(&self) -> Result<Vec<Project>> {
        Ok(self.store.list_projects()?)
    }

    /// Start tracking an existing project directory
    ///
    /// The ecosystem comes from the manifests present and the tool from the
    /// lockfiles, unless `tool` names one. The name defaults to the directory
    /// name. Dependencies are synced straight away.
    pub fn track(&mut self, path: &Path, name: Option<&str>, tool: Option<&str>) -> Result<Project> {
        let path = absolute(path)?;
        let ecosystem =
            Ecosystem::detect(&path).ok_or_else(|| Error::UnknownProjectType(path.clone()))?;
        self.register(&path, name, ecosystem, tool)
    }

    /// Create a new project with the ecosystem's package manager and track it
    pub fn init(
        &mut self,
        path: &Path,
        ecosystem: Ecosystem,
        name: Option<&str>,
        tool: &str,
    ) -> Result<Project> {
        // Nothing may touch the directory until we know it's ours to set up
        let manager = self.registry.require_available(ecosystem, tool)?;
        if path.exists() {
            self.ensure_untracked(&absolute(path)?)?;
        }

        std::fs::create_dir_all(path)?;
        let path = absolute(path)?;
        info!("Initializing {} project in {} with {}", ecosystem, path.display(), tool);
        manager.init(&path)?;

        self.register(&path, name, ecosystem, Some(tool))
    }

    fn ensure_untracked(&self, path: &Path) -> Result<()> {
        match self.store.get_project_by_path(path) {
            Ok(_) => Err(StoreError::DuplicatePath(path.display().to_string()).into()),
            Err(StoreError::ProjectNotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn register(
        &mut self,
        path: &Path,
        name: Option<&str>,
        ecosystem: Ecosystem,
        tool: Option<&str>,
    ) -> Result<Project> {
        let tool = match tool {
            Some(tool) => self.registry.get_for(ecosystem, tool)?.name(),
            None => ecosystem.detect_tool(path),
        };
        let name = match name {
            Some(name) => name.to_string(),
            None => directory_name(path),
        };

        let project = self.store.create_project(&name, path, ecosystem, tool)?;
        info!(
            "Tracking {} ({} with {}) at {}",
            project.name,
            ecosystem.display_name(),
            tool,
            path.display()
        );

        self.resync(&project);
        Ok(project)
    }

    /// Parse the manifest and replace the stored snapshot with it
    pub fn sync(&mut self, project: &Project) -> Result<usize> {
        let deps = parse_project(project.ecosystem, &project.path)?;
        Ok(self.store.sync_dependencies(&project.id, &deps)?)
    }

    /// Sync after a package manager already did its work. The manifest
    /// change happened either way, so a failure here is only reported.
    fn resync(&mut self, project: &Project) {
        if let Err(e) = self.sync(project) {
            warn!("Could not sync dependencies for {}: {}", project.name, e);
        }
    }

    pub fn dependencies(&self, project: &Project) -> Result<Vec<StoredDependency>> {
        Ok(self.store.dependencies(&project.id)?)
    }

    pub fn summary(&self, project: &Project) -> Result<DependencySummary> {
        let deps = self.store.dependency_set(&project.id)?;
        Ok(DependencySummary::new(deps.values()))
    }

    fn manager(&self, project: &Project) -> Result<&dyn PackageManager> {
        Ok(self
            .registry
            .require_available(project.ecosystem, &project.tool)?)
    }

    pub fn add(&mut self, project: &Project, packages: &[String], dev: bool) -> Result<()> {
        if packages.is_empty() {
            return Err(Error::NoPackages);
        }
        self.manager(project)?.add(&project.path, packages, dev)?;
        self.resync(project);
        Ok(())
    }

    pub fn remove(&mut self, project: &Project, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Err(Error::NoPackages);
        }
        self.manager(project)?.remove(&project.path, packages)?;
        self.resync(project);
        Ok(())
    }

    pub fn install(&mut self, project: &Project) -> Result<()> {
        self.manager(project)?.install(&project.path)?;
        self.resync(project);
        Ok(())
    }

    /// Update the named packages, or all of them when `packages` is empty
    pub fn update(&mut self, project: &Project, packages: &[String]) -> Result<()> {
        self.manager(project)?.update(&project.path, packages)?;
        self.resync(project);
        Ok(())
    }

    pub fn run(&self, project: &Project, script: &str, args: &[String]) -> Result<()> {
        Ok(self.manager(project)?.run(&project.path, script, args)?)
    }

    pub fn outdated(&self, project: &Project) -> Result<String> {
        Ok(self.manager(project)?.outdated(&project.path)?)
    }

    /// Switch a project to another package manager of the same ecosystem
    pub fn reassign_tool(&mut self, project: &Project, tool: &str) -> Result<Project> {
        let tool = self.registry.get_for(project.ecosystem, tool)?.name();
        self.store.set_project_tool(&project.id, tool)?;
        info!("{} now uses {}", project.name, tool);
        Ok(self.store.get_project(&project.id)?)
    }

    pub fn rename(&mut self, project: &Project, new_name: &str) -> Result<Project> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(StoreError::InvalidProject("project name can't be empty".into()).into());
        }
        self.store.rename_project(&project.id, new_name)?;
        Ok(self.store.get_project(&project.id)?)
    }

    /// Forget a project and its dependency rows. Files on disk are left alone.
    pub fn untrack(&mut self, project: &Project) -> Result<()> {
        self.store.delete_project(&project.id)?;
        info!("Stopped tracking {}", project.name);
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::fs::canonicalize(path)?)
}

fn directory_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use projkit_pm::{CommandOutput, CommandRunner, PmError, ToolCommand};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Every tool is installed and every command succeeds without doing anything
    struct NoopRunner;

    impl CommandRunner for NoopRunner {
        fn output(&self, _command: &ToolCommand) -> projkit_pm::Result<CommandOutput> {
            Ok(CommandOutput::with_stdout(""))
        }

        fn interactive(&self, _command: &ToolCommand) -> projkit_pm::Result<Option<i32>> {
            Ok(Some(0))
        }

        fn locate(&self, program: &str) -> Option<PathBuf> {
            Some(PathBuf::from(program))
        }
    }

    fn tracker() -> Tracker {
        Tracker::new(
            Store::in_memory().unwrap(),
            Registry::new(Arc::new(NoopRunner)),
        )
    }

    fn js_project(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            r#"{"dependencies":{"react":"^18.0.0"},"devDependencies":{"typescript":"^5.0.0"}}"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_track_detects_and_syncs() {
        let temp_dir = TempDir::new().unwrap();
        let dir = js_project(temp_dir.path(), "web");
        fs::write(dir.join("bun.lockb"), "").unwrap();

        let mut tracker = tracker();
        let project = tracker.track(&dir, None, None).unwrap();

        assert_eq!(project.name, "web");
        assert_eq!(project.ecosystem, Ecosystem::JavaScript);
        assert_eq!(project.tool, "bun");
        assert_eq!(project.path, fs::canonicalize(&dir).unwrap());

        let summary = tracker.summary(&project).unwrap();
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.development_count, 1);
    }

    #[test]
    fn test_track_rejects_foreign_tool_and_unknown_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let dir = js_project(temp_dir.path(), "web");
        let mut tracker = tracker();

        let err = tracker.track(&dir, None, Some("poetry")).unwrap_err();
        assert!(matches!(
            err,
            Error::PackageManager(PmError::UnknownTool { .. })
        ));

        let empty = temp_dir.path().join("empty");
        fs::create_dir_all(&empty).unwrap();
        assert!(matches!(
            tracker.track(&empty, None, None),
            Err(Error::UnknownProjectType(_))
        ));
        assert!(tracker.list().unwrap().is_empty());
    }

    #[test]
    fn test_track_with_broken_manifest_still_tracks() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), "{ not json").unwrap();

        let mut tracker = tracker();
        let project = tracker.track(&dir, Some("broken"), Some("npm")).unwrap();

        assert!(tracker.dependencies(&project).unwrap().is_empty());
        assert!(matches!(tracker.sync(&project), Err(Error::Manifest(_))));
    }

    #[test]
    fn test_resolve() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = tracker();
        let web = tracker
            .track(&js_project(temp_dir.path(), "web"), None, None)
            .unwrap();
        let api_one = tracker
            .track(&js_project(&temp_dir.path().join("a"), "api"), None, None)
            .unwrap();
        tracker
            .track(&js_project(&temp_dir.path().join("b"), "api"), None, None)
            .unwrap();

        let cwd = web.path.join("src");
        fs::create_dir_all(&cwd).unwrap();

        assert_eq!(tracker.resolve_from(".", &cwd).unwrap().id, web.id);
        assert_eq!(tracker.resolve_from(&api_one.id, &cwd).unwrap().id, api_one.id);
        assert_eq!(tracker.resolve_from("web", &cwd).unwrap().id, web.id);

        match tracker.resolve_from("api", &cwd).unwrap_err() {
            Error::AmbiguousProject { name, candidates } => {
                assert_eq!(name, "api");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            tracker.resolve_from("nope", &cwd),
            Err(Error::ProjectNotFound(_))
        ));
        assert!(matches!(
            tracker.resolve_from(".", temp_dir.path()),
            Err(Error::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_add_requires_packages() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = tracker();
        let project = tracker
            .track(&js_project(temp_dir.path(), "web"), None, None)
            .unwrap();

        assert!(matches!(tracker.add(&project, &[], false), Err(Error::NoPackages)));
        assert!(matches!(tracker.remove(&project, &[]), Err(Error::NoPackages)));
    }

    #[test]
    fn test_reassign_rename_untrack() {
        let temp_dir = TempDir::new().unwrap();
        let mut tracker = tracker();
        let project = tracker
            .track(&js_project(temp_dir.path(), "web"), None, Some("npm"))
            .unwrap();

        let project = tracker.reassign_tool(&project, "pnpm").unwrap();
        assert_eq!(project.tool, "pnpm");
        assert!(matches!(
            tracker.reassign_tool(&project, "cargo"),
            Err(Error::PackageManager(PmError::UnknownTool { .. }))
        ));

        let project = tracker.rename(&project, "frontend").unwrap();
        assert_eq!(project.name, "frontend");
        assert!(tracker.rename(&project, "  ").is_err());

        tracker.untrack(&project).unwrap();
        assert!(tracker.list().unwrap().is_empty());
        assert!(project.path.exists());
    }
}
