use crate::cargo::Cargo;
use crate::error::{PmError, Result};
use crate::golang::GoModules;
use crate::manager::PackageManager;
use crate::node::NodePackageManager;
use crate::process::{CommandRunner, SystemRunner};
use crate::python::{Pip, Poetry, Uv};
use projkit_deps::Ecosystem;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Lookup from ecosystem and tool name to the adapter that drives it
///
/// Built once by whoever needs it and passed around; there is no global
/// registry.
pub struct Registry {
    managers: BTreeMap<Ecosystem, Vec<Box<dyn PackageManager>>>,
}

impl Registry {
    /// Every built-in adapter, all sharing `runner`
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let mut registry = Self::empty();

        registry.register(Box::new(NodePackageManager::pnpm(runner.clone())));
        registry.register(Box::new(NodePackageManager::npm(runner.clone())));
        registry.register(Box::new(NodePackageManager::bun(runner.clone())));

        registry.register(Box::new(Uv::new(runner.clone())));
        registry.register(Box::new(Pip::new(runner.clone())));
        registry.register(Box::new(Poetry::new(runner.clone())));

        registry.register(Box::new(GoModules::new(runner.clone())));
        registry.register(Box::new(Cargo::new(runner)));

        registry
    }

    /// Built-in adapters running real processes
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    pub fn empty() -> Self {
        Self {
            managers: BTreeMap::new(),
        }
    }

    /// Add an adapter, replacing any with the same name in its ecosystem
    pub fn register(&mut self, manager: Box<dyn PackageManager>) {
        let slot = self.managers.entry(manager.ecosystem()).or_default();
        match slot.iter().position(|m| m.name() == manager.name()) {
            Some(i) => slot[i] = manager,
            None => slot.push(manager),
        }
    }

    /// Look up by ecosystem identifier (any accepted spelling) and tool name
    pub fn get(&self, ecosystem: &str, tool: &str) -> Result<&dyn PackageManager> {
        let ecosystem: Ecosystem = ecosystem.parse()?;
        self.get_for(ecosystem, tool)
    }

    pub fn get_for(&self, ecosystem: Ecosystem, tool: &str) -> Result<&dyn PackageManager> {
        self.managers
            .get(&ecosystem)
            .and_then(|managers| managers.iter().find(|m| m.name() == tool))
            .map(|m| m.as_ref())
            .ok_or_else(|| PmError::UnknownTool {
                ecosystem,
                tool: tool.to_string(),
            })
    }

    /// Like [`get_for`](Self::get_for), but the tool must also be installed
    pub fn require_available(&self, ecosystem: Ecosystem, tool: &str) -> Result<&dyn PackageManager> {
        let manager = self.get_for(ecosystem, tool)?;
        if manager.is_available() {
            Ok(manager)
        } else {
            Err(PmError::ToolUnavailable(tool.to_string()))
        }
    }

    /// Registered tool names for an ecosystem, in registration order
    pub fn tools(&self, ecosystem: Ecosystem) -> Vec<&'static str> {
        self.managers
            .get(&ecosystem)
            .map(|managers| managers.iter().map(|m| m.name()).collect())
            .unwrap_or_default()
    }

    /// Adapters for `ecosystem` whose tool is installed
    pub fn list_available(&self, ecosystem: Ecosystem) -> Vec<&dyn PackageManager> {
        self.managers
            .get(&ecosystem)
            .into_iter()
            .flatten()
            .filter(|m| m.is_available())
            .map(|m| m.as_ref())
            .collect()
    }

    /// Installed adapters across every ecosystem
    pub fn list_all_available(&self) -> Vec<&dyn PackageManager> {
        Ecosystem::ALL
            .iter()
            .flat_map(|ecosystem| self.list_available(*ecosystem))
            .collect()
    }

    /// Find an adapter by tool name alone, searching ecosystems in order
    #[deprecated(note = "tool names are only unique per ecosystem; use `get` or `get_for`")]
    pub fn find_by_tool(&self, tool: &str) -> Result<&dyn PackageManager> {
        debug!("Looking up package manager {} without an ecosystem", tool);
        Ecosystem::ALL
            .iter()
            .find_map(|ecosystem| self.get_for(*ecosystem, tool).ok())
            .ok_or_else(|| PmError::UnknownToolName(tool.to_string()))
    }
}
