use projkit_deps::{Ecosystem, UnsupportedEcosystem};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PmError>;

/// Everything that can go wrong resolving or driving a package manager
#[derive(Error, Debug)]
pub enum PmError {
    #[error(transparent)]
    UnsupportedEcosystem(#[from] UnsupportedEcosystem),

    #[error("unknown package manager '{tool}' for {ecosystem}")]
    UnknownTool { ecosystem: Ecosystem, tool: String },

    #[error("unknown package manager: {0}")]
    UnknownToolName(String),

    #[error("{0} is not installed or not on PATH")]
    ToolUnavailable(String),

    #[error("`{command}` failed with exit code {}\n{output}", display_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create virtual environment at {}: {reason}", path.display())]
    EnvironmentBootstrap { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}
