use super::{decode_error, read_manifest, ManifestParser};
use crate::ecosystem::Ecosystem;
use crate::error::Result;
use crate::models::{Dependency, DependencyKind, DependencySet};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Reads pyproject.toml when it declares anything, requirements.txt otherwise
pub struct PythonParser;

impl ManifestParser for PythonParser {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn parse(&self, project_root: &Path) -> Result<DependencySet> {
        let pyproject = project_root.join("pyproject.toml");
        if let Some(content) = read_manifest(&pyproject)? {
            let deps = parse_pyproject_toml(&content).map_err(|e| decode_error(&pyproject, e))?;
            if !deps.is_empty() {
                return Ok(deps);
            }
            debug!("pyproject.toml declares no dependencies, trying requirements.txt");
        }

        let requirements = project_root.join("requirements.txt");
        Ok(read_manifest(&requirements)?
            .map(|content| parse_requirements_txt(&content))
            .unwrap_or_default())
    }
}

fn requirement_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // name, optional [extras], optional operator, then the version up to a marker or comment
        Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?\s*([=<>!~]+)?\s*([^;#]*)")
            .expect("requirement pattern is valid")
    })
}

/// Split a single requirement into (name, version range).
///
/// A bare name gets `*`. Returns `None` for anything that doesn't look like
/// `name`, `name<op>version` or `name[extras]<op>version`.
pub fn parse_requirement(line: &str) -> Option<(String, String)> {
    let caps = requirement_pattern().captures(line.trim())?;
    let name = caps[1].to_string();
    let operator = caps.get(2).map_or("", |m| m.as_str());
    // Per-requirement options (--hash) and a trailing `\` continuation aren't part of the range
    let version: String = caps
        .get(3)
        .map_or("", |m| m.as_str())
        .split_whitespace()
        .take_while(|part| !part.starts_with("--"))
        .map(|part| part.trim_end_matches('\\'))
        .collect();

    match (operator.is_empty(), version.is_empty()) {
        (true, true) => Some((name, "*".to_string())),
        (false, false) => Some((name, format!("{}{}", operator, version))),
        // "name==" or "name something"
        _ => None,
    }
}

/// Parse requirements.txt for Python dependencies
///
/// The format has no notion of dev dependencies, so everything is production.
pub fn parse_requirements_txt(content: &str) -> DependencySet {
    let mut dependencies = DependencySet::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines, comments and pip options (-r, -e, --index-url, ...)
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }

        match parse_requirement(line) {
            Some((name, version)) => {
                dependencies.insert(name.clone(), Dependency::production(name, version));
            }
            None => debug!("Skipping malformed requirement: {}", line),
        }
    }

    dependencies
}

/// Parse the dependency declarations of a pyproject.toml
///
/// Understands PEP 621 `[project]`, PEP 735 `[dependency-groups]`, uv's
/// legacy dev list and Poetry's tables. Dev sources are applied last.
pub fn parse_pyproject_toml(content: &str) -> std::result::Result<DependencySet, toml::de::Error> {
    let doc: toml::Value = toml::from_str(content)?;
    let tool = doc.get("tool");
    let poetry = tool.and_then(|t| t.get("poetry"));
    let mut dependencies = DependencySet::new();

    if let Some(list) = doc.get("project").and_then(|p| p.get("dependencies")) {
        insert_requirement_list(&mut dependencies, list, DependencyKind::Production);
    }
    if let Some(table) = poetry.and_then(|p| p.get("dependencies")) {
        insert_poetry_table(&mut dependencies, table, DependencyKind::Production);
    }

    if let Some(list) = doc.get("dependency-groups").and_then(|g| g.get("dev")) {
        insert_requirement_list(&mut dependencies, list, DependencyKind::Development);
    }
    if let Some(list) = tool.and_then(|t| t.get("uv")).and_then(|uv| uv.get("dev-dependencies")) {
        insert_requirement_list(&mut dependencies, list, DependencyKind::Development);
    }
    if let Some(table) = poetry.and_then(|p| p.get("dev-dependencies")) {
        insert_poetry_table(&mut dependencies, table, DependencyKind::Development);
    }
    if let Some(table) = poetry
        .and_then(|p| p.get("group"))
        .and_then(|g| g.get("dev"))
        .and_then(|d| d.get("dependencies"))
    {
        insert_poetry_table(&mut dependencies, table, DependencyKind::Development);
    }

    Ok(dependencies)
}

fn insert_requirement_list(deps: &mut DependencySet, list: &toml::Value, kind: DependencyKind) {
    let Some(entries) = list.as_array() else {
        return;
    };

    for entry in entries {
        // Non-strings are things like { include-group = "test" }
        match entry.as_str().and_then(parse_requirement) {
            Some((name, version)) => {
                deps.insert(name.clone(), Dependency::new(name, version, kind));
            }
            None => debug!("Skipping unparseable requirement entry: {}", entry),
        }
    }
}

fn insert_poetry_table(deps: &mut DependencySet, table: &toml::Value, kind: DependencyKind) {
    let Some(entries) = table.as_table() else {
        return;
    };

    for (name, value) in entries {
        // The interpreter constraint lives in the same table
        if name == "python" {
            continue;
        }
        deps.insert(name.clone(), Dependency::new(name.clone(), extract_version(value), kind));
    }
}

/// Extract version from TOML value (can be string or table)
fn extract_version(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Table(t) => t
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("*")
            .to_string(),
        _ => "*".to_string(),
    }
}
