use crate::manager::PackageManager;
use crate::process::{run_attached, run_checked, run_report, CommandRunner, ToolCommand};
use crate::Result;
use projkit_deps::{parse_project, Ecosystem};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Script names that are cargo subcommands rather than binary names
const SUBCOMMANDS: &[&str] = &["run", "build", "test", "check", "bench", "clippy", "fmt", "doc"];

pub struct Cargo {
    runner: Arc<dyn CommandRunner>,
}

impl Cargo {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command(&self, dir: &Path) -> ToolCommand {
        ToolCommand::new("cargo").cwd(dir)
    }

    fn exec(&self, cmd: ToolCommand) -> Result<()> {
        run_checked(self.runner.as_ref(), &cmd)?;
        Ok(())
    }

    /// Split names into (regular, dev) using what Cargo.toml currently declares
    fn partition_by_section(&self, dir: &Path, packages: &[String]) -> (Vec<String>, Vec<String>) {
        let declared = match parse_project(Ecosystem::Rust, dir) {
            Ok(declared) => declared,
            Err(e) => {
                warn!("Could not read Cargo.toml, removing from [dependencies]: {}", e);
                Default::default()
            }
        };

        packages
            .iter()
            .cloned()
            .partition(|name| !declared.get(name).is_some_and(|dep| dep.is_dev()))
    }
}

impl PackageManager for Cargo {
    fn name(&self) -> &'static str {
        "cargo"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn add(&self, dir: &Path, packages: &[String], dev: bool) -> Result<()> {
        let mut cmd = self.command(dir).arg("add");
        if dev {
            cmd = cmd.arg("--dev");
        }
        self.exec(cmd.args(packages.iter().cloned()))
    }

    /// `cargo remove` only looks in one section per call, so dev
    /// dependencies get their own `--dev` invocation
    fn remove(&self, dir: &Path, packages: &[String]) -> Result<()> {
        let (regular, dev) = self.partition_by_section(dir, packages);
        debug!("Removing {:?} and dev {:?}", regular, dev);

        if !regular.is_empty() {
            self.exec(self.command(dir).arg("remove").args(regular))?;
        }
        if !dev.is_empty() {
            self.exec(self.command(dir).args(["remove", "--dev"]).args(dev))?;
        }
        Ok(())
    }

    fn install(&self, dir: &Path) -> Result<()> {
        self.exec(self.command(dir).arg("build"))
    }

    fn init(&self, dir: &Path) -> Result<()> {
        self.exec(self.command(dir).args(["init", "."]))
    }

    fn run(&self, dir: &Path, script: &str, args: &[String]) -> Result<()> {
        let mut cmd = if SUBCOMMANDS.contains(&script) {
            self.command(dir).arg(script)
        } else {
            self.command(dir).args(["run", "--bin", script])
        };

        let passes_through = script == "run" || !SUBCOMMANDS.contains(&script);
        if passes_through && !args.is_empty() {
            cmd = cmd.arg("--");
        }
        run_attached(self.runner.as_ref(), &cmd.args(args.iter().cloned()))
    }

    fn update(&self, dir: &Path, packages: &[String]) -> Result<()> {
        let mut cmd = self.command(dir).arg("update");
        for package in packages {
            cmd = cmd.args(["-p", package.as_str()]);
        }
        self.exec(cmd)
    }

    fn outdated(&self, dir: &Path) -> Result<String> {
        let cmd = if self.runner.locate("cargo-outdated").is_some() {
            self.command(dir).args(["outdated", "-R"])
        } else {
            debug!("cargo-outdated not installed, falling back to a dry-run update");
            self.command(dir).args(["update", "--dry-run"])
        };
        run_report(self.runner.as_ref(), &cmd)
    }

    fn is_available(&self) -> bool {
        self.runner.locate("cargo").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{expect_interactive, expect_output, shared, strings};
    use crate::process::{CommandOutput, MockCommandRunner};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ok() -> CommandOutput {
        CommandOutput::with_stdout("")
    }

    #[test]
    fn test_add() {
        let mut mock = MockCommandRunner::new();
        expect_output(&mut mock, "cargo", &["add", "serde", "serde_json"], ok());
        expect_output(&mut mock, "cargo", &["add", "--dev", "mockall"], ok());
        let cargo = Cargo::new(shared(mock));

        let dir = Path::new("/work/cli");
        cargo.add(dir, &strings(&["serde", "serde_json"]), false).unwrap();
        cargo.add(dir, &strings(&["mockall"]), true).unwrap();
    }

    #[test]
    fn test_remove_splits_dev_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("Cargo.toml"),
            "[dependencies]\nserde = \"1.0\"\nregex = \"1\"\n[dev-dependencies]\nmockall = \"0.11\"\n",
        )
        .unwrap();

        let mut mock = MockCommandRunner::new();
        expect_output(&mut mock, "cargo", &["remove", "serde", "unknown"], ok());
        expect_output(&mut mock, "cargo", &["remove", "--dev", "mockall"], ok());

        Cargo::new(shared(mock))
            .remove(temp_dir.path(), &strings(&["serde", "mockall", "unknown"]))
            .unwrap();
    }

    #[test]
    fn test_remove_only_dev() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("Cargo.toml"),
            "[dev-dependencies]\ntempfile = \"3\"\n",
        )
        .unwrap();

        let mut mock = MockCommandRunner::new();
        expect_output(&mut mock, "cargo", &["remove", "--dev", "tempfile"], ok());

        Cargo::new(shared(mock))
            .remove(temp_dir.path(), &strings(&["tempfile"]))
            .unwrap();
    }

    #[test]
    fn test_install_init_update() {
        let mut mock = MockCommandRunner::new();
        expect_output(&mut mock, "cargo", &["build"], ok());
        expect_output(&mut mock, "cargo", &["init", "."], ok());
        expect_output(&mut mock, "cargo", &["update"], ok());
        expect_output(&mut mock, "cargo", &["update", "-p", "serde", "-p", "tokio"], ok());
        let cargo = Cargo::new(shared(mock));

        let dir = Path::new("/work/cli");
        cargo.install(dir).unwrap();
        cargo.init(dir).unwrap();
        cargo.update(dir, &[]).unwrap();
        cargo.update(dir, &strings(&["serde", "tokio"])).unwrap();
    }

    #[test]
    fn test_run_subcommands_and_binaries() {
        let mut mock = MockCommandRunner::new();
        expect_interactive(&mut mock, "cargo", &["test", "parser"]);
        expect_interactive(&mut mock, "cargo", &["run", "--", "--verbose"]);
        expect_interactive(&mut mock, "cargo", &["clippy"]);
        expect_interactive(&mut mock, "cargo", &["run", "--bin", "migrate", "--", "up"]);
        expect_interactive(&mut mock, "cargo", &["run", "--bin", "server"]);
        let cargo = Cargo::new(shared(mock));

        let dir = Path::new("/work/cli");
        cargo.run(dir, "test", &strings(&["parser"])).unwrap();
        cargo.run(dir, "run", &strings(&["--verbose"])).unwrap();
        cargo.run(dir, "clippy", &[]).unwrap();
        cargo.run(dir, "migrate", &strings(&["up"])).unwrap();
        cargo.run(dir, "server", &[]).unwrap();
    }

    #[test]
    fn test_outdated_prefers_plugin() {
        let mut mock = MockCommandRunner::new();
        mock.expect_locate()
            .withf(|program| program == "cargo-outdated")
            .returning(|_| Some(PathBuf::from("/home/dev/.cargo/bin/cargo-outdated")));
        expect_output(&mut mock, "cargo", &["outdated", "-R"], ok());

        Cargo::new(shared(mock)).outdated(Path::new("/work/cli")).unwrap();
    }

    #[test]
    fn test_outdated_without_plugin() {
        let mut mock = MockCommandRunner::new();
        mock.expect_locate().returning(|_| None);
        expect_output(
            &mut mock,
            "cargo",
            &["update", "--dry-run"],
            CommandOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: "    Updating serde v1.0.190 -> v1.0.193\n".to_string(),
            },
        );

        let report = Cargo::new(shared(mock)).outdated(Path::new("/work/cli")).unwrap();
        assert!(report.contains("serde"));
    }
}
