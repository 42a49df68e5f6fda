use crate::Result;
use projkit_deps::Ecosystem;
use std::path::Path;

/// What every package manager adapter can do for a project
///
/// All operations run with the project directory as working directory.
/// Failures carry the command line and whatever the tool printed, so the
/// caller can show something more useful than "exit code 1".
pub trait PackageManager: Send + Sync {
    /// Tool name as users type it, e.g. "pnpm"
    fn name(&self) -> &'static str;

    fn ecosystem(&self) -> Ecosystem;

    /// Add packages to the manifest and install them
    fn add(&self, dir: &Path, packages: &[String], dev: bool) -> Result<()>;

    fn remove(&self, dir: &Path, packages: &[String]) -> Result<()>;

    /// Install everything the manifest declares
    fn install(&self, dir: &Path) -> Result<()>;

    /// Create a fresh manifest in `dir`
    fn init(&self, dir: &Path) -> Result<()>;

    /// Run a script or entry point, attached to the terminal
    fn run(&self, dir: &Path, script: &str, args: &[String]) -> Result<()>;

    /// Update the named packages, or everything when `packages` is empty
    fn update(&self, dir: &Path, packages: &[String]) -> Result<()>;

    /// Report of packages with newer versions available
    fn outdated(&self, dir: &Path) -> Result<String>;

    /// Whether the tool can be found on this machine
    fn is_available(&self) -> bool;
}
