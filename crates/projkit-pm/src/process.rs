//! Subprocess execution for package-manager adapters.
//!
//! Adapters describe what to run as a [`ToolCommand`] and hand it to a
//! [`CommandRunner`]. The real runner spawns processes; tests swap in a mock.

use crate::error::{PmError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// A program invocation: executable, arguments and working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ToolCommand {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn get_program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// True when the program is `name`, either bare or as a path ending in it
    pub fn is_program(&self, name: &str) -> bool {
        self.program == Path::new(name) || self.program.file_name() == Some(OsStr::new(name))
    }

    /// Display the command for logs and error messages
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

/// What a captured run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// A successful run that printed `stdout`
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        CommandOutput {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A run that exited with `code` and printed `stderr`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout and stderr joined, trimmed of surrounding blank space
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{}\n{}", stdout, stderr),
            (false, true) => stdout.to_string(),
            _ => stderr.to_string(),
        }
    }
}

/// Launches external programs on behalf of the adapters
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run to completion with output captured. A non-zero exit is *not* an
    /// error here; only failing to start the process is.
    fn output(&self, command: &ToolCommand) -> Result<CommandOutput>;

    /// Run attached to the current terminal and return the exit code
    fn interactive(&self, command: &ToolCommand) -> Result<Option<i32>>;

    /// Find an executable in PATH
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Runs commands for real
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, command: &ToolCommand) -> Result<CommandOutput> {
        let output = command
            .build_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PmError::Spawn {
                command: command.display_command(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn interactive(&self, command: &ToolCommand) -> Result<Option<i32>> {
        let status = command
            .build_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| PmError::Spawn {
                command: command.display_command(),
                source,
            })?;

        Ok(status.code())
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Execute with output captured and require success
pub fn run_checked(runner: &dyn CommandRunner, command: &ToolCommand) -> Result<CommandOutput> {
    debug!("Running `{}`", command.display_command());
    let output = runner.output(command)?;
    if output.success() {
        Ok(output)
    } else {
        Err(PmError::CommandFailed {
            command: command.display_command(),
            code: output.code,
            output: output.combined(),
        })
    }
}

/// Execute attached to the terminal and require success
pub fn run_attached(runner: &dyn CommandRunner, command: &ToolCommand) -> Result<()> {
    debug!("Running `{}` attached to terminal", command.display_command());
    match runner.interactive(command)? {
        Some(0) => Ok(()),
        code => Err(PmError::CommandFailed {
            command: command.display_command(),
            code,
            output: String::new(),
        }),
    }
}

/// Execute for a report. Non-zero exit is how most `outdated` commands say
/// "there are updates", so it is returned as output, not as an error.
pub fn run_report(runner: &dyn CommandRunner, command: &ToolCommand) -> Result<String> {
    debug!("Running `{}` for report", command.display_command());
    let output = runner.output(command)?;
    if !output.success() {
        debug!("`{}` exited with {:?}", command.display_command(), output.code);
    }
    Ok(output.combined())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Arc;

    /// Expect exactly one captured run of `program args...`, answering with `output`
    pub fn expect_output(
        mock: &mut MockCommandRunner,
        program: &'static str,
        args: &'static [&'static str],
        output: CommandOutput,
    ) {
        mock.expect_output()
            .withf(move |cmd| cmd.is_program(program) && cmd.get_args() == args)
            .times(1)
            .returning(move |_| Ok(output.clone()));
    }

    /// Expect exactly one successful attached run of `program args...`
    pub fn expect_interactive(
        mock: &mut MockCommandRunner,
        program: &'static str,
        args: &'static [&'static str],
    ) {
        mock.expect_interactive()
            .withf(move |cmd| cmd.is_program(program) && cmd.get_args() == args)
            .times(1)
            .returning(|_| Ok(Some(0)));
    }

    pub fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    pub fn shared(mock: MockCommandRunner) -> Arc<dyn CommandRunner> {
        Arc::new(mock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let cmd = ToolCommand::new("pnpm").args(["add", "-D", "vitest"]);
        assert_eq!(cmd.display_command(), "pnpm add -D vitest");
    }

    #[test]
    fn test_is_program_matches_paths() {
        let cmd = ToolCommand::new(Path::new("venv").join("bin").join("pip"));
        assert!(cmd.is_program("pip"));
        assert!(!cmd.is_program("python"));
        assert!(ToolCommand::new("go").is_program("go"));
    }

    #[test]
    fn test_combined_output() {
        let output = CommandOutput {
            code: Some(1),
            stdout: "out\n".to_string(),
            stderr: "  err\n".to_string(),
        };
        assert_eq!(output.combined(), "out\nerr");
        assert_eq!(CommandOutput::failed(2, "boom").combined(), "boom");
    }

    #[test]
    fn test_run_checked_surfaces_failure_with_output() {
        let mut mock = MockCommandRunner::new();
        mock.expect_output()
            .returning(|_| Ok(CommandOutput::failed(1, "ERR! 404 Not Found")));

        let cmd = ToolCommand::new("npm").args(["install", "nope"]).cwd("/tmp");
        let err = run_checked(&mock, &cmd).unwrap_err();
        match err {
            PmError::CommandFailed { command, code, output } => {
                assert_eq!(command, "npm install nope");
                assert_eq!(code, Some(1));
                assert!(output.contains("404"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_report_tolerates_non_zero_exit() {
        let mut mock = MockCommandRunner::new();
        mock.expect_output().returning(|_| {
            Ok(CommandOutput {
                code: Some(1),
                stdout: "Package  Current  Wanted\nreact    17.0.2   18.2.0\n".to_string(),
                stderr: String::new(),
            })
        });

        let report = run_report(&mock, &ToolCommand::new("npm").arg("outdated")).unwrap();
        assert!(report.contains("react"));
    }

    #[test]
    fn test_run_attached_failure() {
        let mut mock = MockCommandRunner::new();
        mock.expect_interactive().returning(|_| Ok(Some(130)));

        let err = run_attached(&mock, &ToolCommand::new("npm").args(["run", "dev"])).unwrap_err();
        assert!(matches!(err, PmError::CommandFailed { code: Some(130), .. }));
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let err = SystemRunner
            .output(&ToolCommand::new("definitely-not-a-real-command-12345"))
            .unwrap_err();
        assert!(matches!(err, PmError::Spawn { .. }));
        assert!(SystemRunner.locate("definitely-not-a-real-command-12345").is_none());
    }
}
