use super::{read_manifest, ManifestParser};
use crate::ecosystem::Ecosystem;
use crate::error::Result;
use crate::models::{Dependency, DependencyKind, DependencySet};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

pub struct CargoTomlParser;

impl ManifestParser for CargoTomlParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn parse(&self, project_root: &Path) -> Result<DependencySet> {
        Ok(read_manifest(&project_root.join("Cargo.toml"))?
            .map(|content| parse_cargo_toml(&content))
            .unwrap_or_default())
    }
}

struct Patterns {
    simple: Regex,
    inline_table: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        simple: Regex::new(r#"^([A-Za-z0-9_-]+)\s*=\s*"([^"]+)""#).expect("simple pattern is valid"),
        inline_table: Regex::new(r#"^([A-Za-z0-9_-]+)\s*=\s*\{.*version\s*=\s*"([^"]+)""#)
            .expect("inline table pattern is valid"),
    })
}

/// Parse Cargo.toml for Rust dependencies
///
/// This is a line scan rather than a TOML decode, so a single broken line
/// costs only that entry. Only `[dependencies]` and `[dev-dependencies]` are
/// read; entries without a version (path, git, workspace) are skipped.
pub fn parse_cargo_toml(content: &str) -> DependencySet {
    let patterns = patterns();
    let mut dependencies = DependencySet::new();
    let mut scope: Option<DependencyKind> = None;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') {
            let header = trimmed.split('#').next().unwrap_or_default().trim_end();
            scope = match header {
                "[dependencies]" => Some(DependencyKind::Production),
                "[dev-dependencies]" => Some(DependencyKind::Development),
                _ => None,
            };
            continue;
        }

        let Some(kind) = scope else {
            continue;
        };
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let caps = patterns
            .simple
            .captures(trimmed)
            .or_else(|| patterns.inline_table.captures(trimmed));

        match caps {
            Some(caps) => {
                let name = caps[1].to_string();
                dependencies.insert(name.clone(), Dependency::new(name, &caps[2], kind));
            }
            None => debug!("Skipping dependency line without a version: {}", trimmed),
        }
    }

    dependencies
}
