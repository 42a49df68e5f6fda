use chrono::{DateTime, Utc};
use projkit_deps::{Dependency, DependencyKind, Ecosystem};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A tracked project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// UUIDv7, so ids sort in creation order
    pub id: String,
    pub name: String,
    /// Absolute path, unique across the registry
    pub path: PathBuf,
    pub ecosystem: Ecosystem,
    /// Package manager driving this project, one of `ecosystem.tools()`
    pub tool: String,
    pub created_at: DateTime<Utc>,
}

/// A dependency row as persisted for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDependency {
    pub id: i64,
    pub project_id: String,
    pub name: String,
    pub version: String,
    pub kind: DependencyKind,
    pub created_at: DateTime<Utc>,
}

impl StoredDependency {
    pub fn to_dependency(&self) -> Dependency {
        Dependency::new(self.name.clone(), self.version.clone(), self.kind)
    }
}

/// Generate a fresh, time-ordered project id
pub fn new_project_id() -> String {
    Uuid::now_v7().to_string()
}

/// Whether `input` has the shape of a project id
pub fn is_project_id(input: &str) -> bool {
    Uuid::parse_str(input).is_ok()
}

pub(crate) fn timestamp_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
