use super::run_mode::interpreter_args;
use crate::error::PmError;
use crate::manager::PackageManager;
use crate::process::{run_attached, run_checked, run_report, CommandRunner, ToolCommand};
use crate::Result;
use projkit_deps::Ecosystem;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const VENV_DIR: &str = "venv";
const REQUIREMENTS: &str = "requirements.txt";
const DEV_REQUIREMENTS: &str = "requirements-dev.txt";

/// Plain pip on top of a project-local `venv/`
///
/// pip has no manifest of its own, so after every add or remove the venv is
/// frozen back into the requirements file.
pub struct Pip {
    runner: Arc<dyn CommandRunner>,
}

impl Pip {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Create `venv/` if the project doesn't have one yet
    ///
    /// Tries `python3` first, then `python`.
    pub fn ensure_venv(&self, dir: &Path) -> Result<()> {
        let venv = dir.join(VENV_DIR);
        if venv.exists() {
            return Ok(());
        }

        info!("Creating virtual environment in {}", venv.display());
        let mut failures = Vec::new();
        for interpreter in ["python3", "python"] {
            let cmd = ToolCommand::new(interpreter)
                .args(["-m", "venv", VENV_DIR])
                .cwd(dir);
            debug!("Running `{}`", cmd.display_command());

            match self.runner.output(&cmd) {
                Ok(output) if output.success() => {
                    info!("Created {}", venv.display());
                    return Ok(());
                }
                Ok(output) => failures.push(format!(
                    "`{}` exited with {:?}: {}",
                    cmd.display_command(),
                    output.code,
                    output.combined()
                )),
                Err(e) => failures.push(e.to_string()),
            }
        }

        Err(PmError::EnvironmentBootstrap {
            path: venv,
            reason: failures.join("; "),
        })
    }

    fn pip(&self, dir: &Path) -> ToolCommand {
        ToolCommand::new(venv_executable(dir, "pip")).cwd(dir)
    }

    fn python(&self, dir: &Path) -> ToolCommand {
        ToolCommand::new(venv_executable(dir, "python")).cwd(dir)
    }

    /// Write `pip freeze` into requirements.txt, or requirements-dev.txt for dev adds
    fn freeze(&self, dir: &Path, dev: bool) -> Result<()> {
        let file = if dev { DEV_REQUIREMENTS } else { REQUIREMENTS };
        let output = run_checked(self.runner.as_ref(), &self.pip(dir).arg("freeze"))?;
        fs::write(dir.join(file), output.stdout)?;
        debug!("Froze environment into {}", file);
        Ok(())
    }
}

/// Path to a program inside the project's venv
fn venv_executable(dir: &Path, program: &str) -> PathBuf {
    let venv = dir.join(VENV_DIR);
    if cfg!(windows) {
        venv.join("Scripts").join(format!("{}.exe", program))
    } else {
        venv.join("bin").join(program)
    }
}

impl PackageManager for Pip {
    fn name(&self) -> &'static str {
        "pip"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn add(&self, dir: &Path, packages: &[String], dev: bool) -> Result<()> {
        self.ensure_venv(dir)?;
        let cmd = self.pip(dir).arg("install").args(packages.iter().cloned());
        run_checked(self.runner.as_ref(), &cmd)?;
        self.freeze(dir, dev)
    }

    fn remove(&self, dir: &Path, packages: &[String]) -> Result<()> {
        self.ensure_venv(dir)?;
        let cmd = self
            .pip(dir)
            .args(["uninstall", "-y"])
            .args(packages.iter().cloned());
        run_checked(self.runner.as_ref(), &cmd)?;
        self.freeze(dir, false)
    }

    fn install(&self, dir: &Path) -> Result<()> {
        self.ensure_venv(dir)?;
        for file in [REQUIREMENTS, DEV_REQUIREMENTS] {
            if dir.join(file).exists() {
                run_checked(self.runner.as_ref(), &self.pip(dir).args(["install", "-r", file]))?;
            }
        }
        Ok(())
    }

    fn init(&self, dir: &Path) -> Result<()> {
        self.ensure_venv(dir)?;
        let requirements = dir.join(REQUIREMENTS);
        if !requirements.exists() {
            fs::write(&requirements, "# Python dependencies\n")?;
        }
        Ok(())
    }

    fn run(&self, dir: &Path, script: &str, args: &[String]) -> Result<()> {
        self.ensure_venv(dir)?;
        let python_args = interpreter_args(dir, script, args).unwrap_or_else(|| {
            std::iter::once(script.to_string())
                .chain(args.iter().cloned())
                .collect()
        });
        run_attached(self.runner.as_ref(), &self.python(dir).args(python_args))
    }

    fn update(&self, dir: &Path, packages: &[String]) -> Result<()> {
        self.ensure_venv(dir)?;
        let cmd = if packages.is_empty() {
            if !dir.join(REQUIREMENTS).exists() {
                debug!("No {} in {}, nothing to update", REQUIREMENTS, dir.display());
                return Ok(());
            }
            self.pip(dir).args(["install", "-U", "-r", REQUIREMENTS])
        } else {
            self.pip(dir)
                .args(["install", "-U"])
                .args(packages.iter().cloned())
        };
        run_checked(self.runner.as_ref(), &cmd)?;
        Ok(())
    }

    fn outdated(&self, dir: &Path) -> Result<String> {
        // Don't create a venv just to report on it
        let pip = if dir.join(VENV_DIR).exists() {
            self.pip(dir)
        } else {
            ToolCommand::new("pip").cwd(dir)
        };
        run_report(self.runner.as_ref(), &pip.args(["list", "--outdated"]))
    }

    fn is_available(&self) -> bool {
        // Everything runs through the venv, so what matters is an interpreter to make one
        ["python3", "python"]
            .iter()
            .any(|interpreter| self.runner.locate(interpreter).is_some())
    }
}
