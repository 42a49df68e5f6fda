use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Everything a parser found in one manifest, keyed by dependency name.
///
/// A name can only occupy one slot, so a package listed as both a regular
/// and a dev dependency keeps whichever classification was inserted last.
pub type DependencySet = BTreeMap<String, Dependency>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Declared range exactly as written in the manifest. Never interpreted.
    pub version: String,
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            kind,
        }
    }

    pub fn production(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(name, version, DependencyKind::Production)
    }

    pub fn development(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(name, version, DependencyKind::Development)
    }

    pub fn is_dev(&self) -> bool {
        self.kind == DependencyKind::Development
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Production,
    Development,
}

impl DependencyKind {
    /// Short tag used in the store and in listings
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Production => "prod",
            DependencyKind::Development => "dev",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" | "runtime" => Ok(DependencyKind::Production),
            "dev" | "development" => Ok(DependencyKind::Development),
            other => Err(format!("unknown dependency kind: {}", other)),
        }
    }
}

/// Headline numbers for a parsed or stored dependency list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySummary {
    pub total_count: usize,
    pub production_count: usize,
    pub development_count: usize,
}

impl DependencySummary {
    pub fn new<'a>(dependencies: impl IntoIterator<Item = &'a Dependency>) -> Self {
        let mut production_count = 0;
        let mut development_count = 0;
        for dep in dependencies {
            match dep.kind {
                DependencyKind::Production => production_count += 1,
                DependencyKind::Development => development_count += 1,
            }
        }

        Self {
            total_count: production_count + development_count,
            production_count,
            development_count,
        }
    }
}
