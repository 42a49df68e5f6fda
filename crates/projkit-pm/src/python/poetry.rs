use super::run_mode::interpreter_args;
use crate::manager::PackageManager;
use crate::process::{run_attached, run_checked, run_report, CommandRunner, ToolCommand};
use crate::Result;
use projkit_deps::Ecosystem;
use std::path::Path;
use std::sync::Arc;

/// Poetry, configured at init to keep its virtualenv inside the project
pub struct Poetry {
    runner: Arc<dyn CommandRunner>,
}

impl Poetry {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command(&self, dir: &Path) -> ToolCommand {
        ToolCommand::new("poetry").cwd(dir)
    }

    fn exec(&self, cmd: ToolCommand) -> Result<()> {
        run_checked(self.runner.as_ref(), &cmd)?;
        Ok(())
    }
}

impl PackageManager for Poetry {
    fn name(&self) -> &'static str {
        "poetry"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn add(&self, dir: &Path, packages: &[String], dev: bool) -> Result<()> {
        let mut cmd = self.command(dir).arg("add");
        if dev {
            cmd = cmd.args(["--group", "dev"]);
        }
        self.exec(cmd.args(packages.iter().cloned()))
    }

    fn remove(&self, dir: &Path, packages: &[String]) -> Result<()> {
        self.exec(self.command(dir).arg("remove").args(packages.iter().cloned()))
    }

    fn install(&self, dir: &Path) -> Result<()> {
        self.exec(self.command(dir).arg("install"))
    }

    fn init(&self, dir: &Path) -> Result<()> {
        self.exec(self.command(dir).args(["init", "-n"]))?;
        self.exec(
            self.command(dir)
                .args(["config", "virtualenvs.in-project", "true", "--local"]),
        )
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
        self.exec(self.command(dir).arg("update").args(packages.iter().cloned()))
    }

    fn outdated(&self, dir: &Path) -> Result<String> {
        run_report(self.runner.as_ref(), &self.command(dir).args(["show", "--outdated"]))
    }

    fn is_available(&self) -> bool {
        self.runner.locate("poetry").is_some()
    }
}
