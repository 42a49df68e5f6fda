use crate::manager::PackageManager;
use crate::process::{run_attached, run_checked, run_report, CommandRunner, ToolCommand};
use crate::Result;
use projkit_deps::Ecosystem;
use std::path::Path;
use std::sync::Arc;

/// How one JavaScript tool spells the common operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Spelling {
    name: &'static str,
    add: &'static str,
    remove: &'static str,
    dev_flag: &'static str,
    init: &'static [&'static str],
}

const NPM: Spelling = Spelling {
    name: "npm",
    add: "install",
    remove: "uninstall",
    dev_flag: "--save-dev",
    init: &["init", "-y"],
};

const PNPM: Spelling = Spelling {
    name: "pnpm",
    add: "add",
    remove: "remove",
    dev_flag: "-D",
    init: &["init"],
};

const BUN: Spelling = Spelling {
    name: "bun",
    add: "add",
    remove: "remove",
    dev_flag: "-d",
    init: &["init", "-y"],
};

/// npm, pnpm and bun
///
/// The three only differ in a handful of verbs and flags, so one adapter
/// covers them all.
pub struct NodePackageManager {
    spelling: Spelling,
    runner: Arc<dyn CommandRunner>,
}

impl NodePackageManager {
    pub fn npm(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_spelling(NPM, runner)
    }

    pub fn pnpm(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_spelling(PNPM, runner)
    }

    pub fn bun(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_spelling(BUN, runner)
    }

    fn with_spelling(spelling: Spelling, runner: Arc<dyn CommandRunner>) -> Self {
        Self { spelling, runner }
    }

    fn command(&self, dir: &Path) -> ToolCommand {
        ToolCommand::new(self.spelling.name).cwd(dir)
    }
}

impl PackageManager for NodePackageManager {
    fn name(&self) -> &'static str {
        self.spelling.name
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::JavaScript
    }

    fn add(&self, dir: &Path, packages: &[String], dev: bool) -> Result<()> {
        let mut cmd = self.command(dir).arg(self.spelling.add);
        if dev {
            cmd = cmd.arg(self.spelling.dev_flag);
        }
        run_checked(self.runner.as_ref(), &cmd.args(packages.iter().cloned()))?;
        Ok(())
    }

    fn remove(&self, dir: &Path, packages: &[String]) -> Result<()> {
        let cmd = self
            .command(dir)
            .arg(self.spelling.remove)
            .args(packages.iter().cloned());
        run_checked(self.runner.as_ref(), &cmd)?;
        Ok(())
    }

    fn install(&self, dir: &Path) -> Result<()> {
        run_checked(self.runner.as_ref(), &self.command(dir).arg("install"))?;
        Ok(())
    }

    fn init(&self, dir: &Path) -> Result<()> {
        let cmd = self.command(dir).args(self.spelling.init.iter().copied());
        run_checked(self.runner.as_ref(), &cmd)?;
        Ok(())
    }

    fn run(&self, dir: &Path, script: &str, args: &[String]) -> Result<()> {
        let mut cmd = self.command(dir).args(["run", script]);
        if !args.is_empty() {
            cmd = cmd.arg("--").args(args.iter().cloned());
        }
        run_attached(self.runner.as_ref(), &cmd)
    }

    fn update(&self, dir: &Path, packages: &[String]) -> Result<()> {
        let cmd = self
            .command(dir)
            .arg("update")
            .args(packages.iter().cloned());
        run_checked(self.runner.as_ref(), &cmd)?;
        Ok(())
    }

    fn outdated(&self, dir: &Path) -> Result<String> {
        run_report(self.runner.as_ref(), &self.command(dir).arg("outdated"))
    }

    fn is_available(&self) -> bool {
        self.runner.locate(self.spelling.name).is_some()
    }
}
