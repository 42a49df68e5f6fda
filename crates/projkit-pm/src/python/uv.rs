use super::run_mode::interpreter_args;
use crate::manager::PackageManager;
use crate::process::{run_attached, run_checked, run_report, CommandRunner, ToolCommand};
use crate::Result;
use projkit_deps::Ecosystem;
use std::path::Path;
use std::sync::Arc;

/// uv keeps its own `.venv` and lockfile in sync, so every call goes straight through
pub struct Uv {
    runner: Arc<dyn CommandRunner>,
}

impl Uv {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command(&self, dir: &Path) -> ToolCommand {
        ToolCommand::new("uv").cwd(dir)
    }

    fn exec(&self, cmd: ToolCommand) -> Result<()> {
        run_checked(self.runner.as_ref(), &cmd)?;
        Ok(())
    }
}

impl PackageManager for Uv {
    fn name(&self) -> &'static str {
        "uv"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn add(&self, dir: &Path, packages: &[String], dev: bool) -> Result<()> {
        let mut cmd = self.command(dir).arg("add");
        if dev {
            cmd = cmd.arg("--dev");
        }
        self.exec(cmd.args(packages.iter().cloned()))
    }

    fn remove(&self, dir: &Path, packages: &[String]) -> Result<()> {
        self.exec(self.command(dir).arg("remove").args(packages.iter().cloned()))
    }

    fn install(&self, dir: &Path) -> Result<()> {
        self.exec(self.command(dir).arg("sync"))
    }

    fn init(&self, dir: &Path) -> Result<()> {
        self.exec(self.command(dir).arg("init"))
    }

    fn run(&self, dir: &Path, script: &str, args: &[String]) -> Result<()> {
        let cmd = match interpreter_args(dir, script, args) {
            Some(python_args) => self.command(dir).args(["run", "python"]).args(python_args),
            None => self
                .command(dir)
                .args(["run", script])
                .args(args.iter().cloned()),
        };
        run_attached(self.runner.as_ref(), &cmd)
    }

    fn update(&self, dir: &Path, packages: &[String]) -> Result<()> {
        let mut cmd = self.command(dir).arg("lock");
        if packages.is_empty() {
            cmd = cmd.arg("--upgrade");
        } else {
            for package in packages {
                cmd = cmd.args(["--upgrade-package", package.as_str()]);
            }
        }
        self.exec(cmd)
    }

    fn outdated(&self, dir: &Path) -> Result<String> {
        let cmd = self.command(dir).args(["pip", "list", "--outdated"]);
        run_report(self.runner.as_ref(), &cmd)
    }

    fn is_available(&self) -> bool {
        self.runner.locate("uv").is_some()
    }
}
