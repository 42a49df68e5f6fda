use crate::manager::PackageManager;
use crate::process::{run_attached, run_checked, run_report, CommandRunner, ToolCommand};
use crate::Result;
use projkit_deps::Ecosystem;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Fallback module path when the project directory has no usable name
const DEFAULT_MODULE: &str = "app";

/// Go modules through the `go` tool
pub struct GoModules {
    runner: Arc<dyn CommandRunner>,
}

impl GoModules {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command(&self, dir: &Path) -> ToolCommand {
        ToolCommand::new("go").cwd(dir)
    }

    fn exec(&self, cmd: ToolCommand) -> Result<()> {
        run_checked(self.runner.as_ref(), &cmd)?;
        Ok(())
    }
}

impl PackageManager for GoModules {
    fn name(&self) -> &'static str {
        "go"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    /// One `go get` per module; the dev flag means nothing to Go
    fn add(&self, dir: &Path, packages: &[String], _dev: bool) -> Result<()> {
        for package in packages {
            self.exec(self.command(dir).args(["get", package.as_str()]))?;
        }
        Ok(())
    }

    /// Go has no per-module remove. Tidy drops whatever the code no longer
    /// imports, which is the named modules once their imports are gone.
    fn remove(&self, dir: &Path, packages: &[String]) -> Result<()> {
        debug!("go has no module remove, tidying instead of removing {:?}", packages);
        self.exec(self.command(dir).args(["mod", "tidy"]))
    }

    fn install(&self, dir: &Path) -> Result<()> {
        self.exec(self.command(dir).args(["mod", "download"]))
    }

    fn init(&self, dir: &Path) -> Result<()> {
        let module = dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_MODULE);
        self.exec(self.command(dir).args(["mod", "init", module]))
    }

    fn run(&self, dir: &Path, script: &str, args: &[String]) -> Result<()> {
        let cmd = match script {
            "build" | "test" | "vet" => self.command(dir).args([script, "./..."]),
            "run" => self.command(dir).args(["run", "."]),
            _ => self.command(dir).args(["run", script]),
        };
        run_attached(self.runner.as_ref(), &cmd.args(args.iter().cloned()))
    }

    fn update(&self, dir: &Path, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return self.exec(self.command(dir).args(["get", "-u", "./..."]));
        }
        for package in packages {
            self.exec(self.command(dir).args(["get", "-u", package.as_str()]))?;
        }
        Ok(())
    }

    /// Only modules with a newer release, which `go list -u` marks as
    /// `path current [latest]`. Everything current comes back empty.
    fn outdated(&self, dir: &Path) -> Result<String> {
        let cmd = self.command(dir).args(["list", "-u", "-m", "all"]);
        let report = run_report(self.runner.as_ref(), &cmd)?;
        Ok(upgradable_modules(&report))
    }

    fn is_available(&self) -> bool {
        self.runner.locate("go").is_some()
    }
}

fn upgradable_modules(report: &str) -> String {
    report
        .lines()
        .map(str::trim)
        .filter(|line| line.ends_with(']') && line.contains(" ["))
        .collect::<Vec<_>>()
        .join("\n")
}
