// Package manager adapters: one PackageManager impl per tool, looked up
// through a Registry. Every subprocess goes through a CommandRunner so the
// adapters can be tested without the tools installed.

pub mod cargo;
pub mod error;
pub mod golang;
pub mod manager;
pub mod node;
pub mod process;
pub mod python;
pub mod registry;

pub use cargo::Cargo;
pub use error::{PmError, Result};
pub use golang::GoModules;
pub use manager::PackageManager;
pub use node::NodePackageManager;
pub use process::{CommandOutput, CommandRunner, SystemRunner, ToolCommand};
pub use python::{Pip, Poetry, RunMode, Uv};
pub use registry::Registry;
