use projkit_deps::ManifestError;
use projkit_pm::PmError;
use projkit_store::{Project, StoreError};
use std::path::PathBuf;
use thiserror::Error;

/// Everything a tracker operation can fail with
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    PackageManager(#[from] PmError),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("'{name}' matches {} projects:\n{}", .candidates.len(), describe(.candidates))]
    AmbiguousProject {
        name: String,
        candidates: Vec<Project>,
    },

    #[error("Could not tell what kind of project {} is (no Cargo.toml, go.mod, pyproject.toml, requirements.txt or package.json)", .0.display())]
    UnknownProjectType(PathBuf),

    #[error("No packages given")]
    NoPackages,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn describe(candidates: &[Project]) -> String {
    candidates
        .iter()
        .map(|p| format!("  {} ({}) - {}", p.name, p.id, p.path.display()))
        .collect::<Vec<_>>()
        .join("\n")
}
